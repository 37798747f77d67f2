//! 应用层 - 命令
//!
//! 语音合成是带副作用的读：命中缓存直接返回，未命中则合成并落盘

mod speech_commands;

pub mod handlers;

pub use speech_commands::*;
