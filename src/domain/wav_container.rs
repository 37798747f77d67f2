//! WAV 容器编码
//!
//! 把原始 16 位小端 PCM 包装成标准 RIFF/WAVE 容器，以及反向读取容器头

use thiserror::Error;

/// WAV 头固定长度（RIFF + fmt + data chunk 头）
pub const WAV_HEADER_LEN: usize = 44;

/// 合成服务的固定输出格式
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;
pub const DEFAULT_CHANNELS: u16 = 1;
pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// PCM 格式参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
        }
    }
}

impl PcmFormat {
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * self.bytes_per_sample() as u32
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bytes_per_sample()
    }

    /// 根据数据长度估算时长（毫秒）
    pub fn duration_ms(&self, data_len: usize) -> u64 {
        let byte_rate = self.byte_rate() as u64;
        if byte_rate == 0 {
            return 0;
        }
        data_len as u64 * 1000 / byte_rate
    }
}

/// WAV 解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WavError {
    #[error("WAV data too short: {0} bytes")]
    TooShort(usize),

    #[error("Invalid WAV: missing {0} tag")]
    MissingTag(&'static str),

    #[error("Invalid WAV: unsupported encoding {0}")]
    UnsupportedEncoding(u16),

    #[error("Invalid WAV: data chunk exceeds buffer")]
    TruncatedData,
}

/// 解析后的 WAV 容器（借用原始字节）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer<'a> {
    pub format: PcmFormat,
    pub samples: &'a [u8],
}

/// 将 PCM 样本编码为 WAV
///
/// 对任意长度的输入都成立，不做 I/O
pub fn encode_wav(pcm: &[u8], format: PcmFormat) -> Vec<u8> {
    let data_size = pcm.len() as u32;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&format.channels.to_le_bytes());
    wav.extend_from_slice(&format.sample_rate.to_le_bytes());
    wav.extend_from_slice(&format.byte_rate().to_le_bytes());
    wav.extend_from_slice(&format.block_align().to_le_bytes());
    wav.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());

    wav.extend_from_slice(pcm);
    wav
}

fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// 读取 WAV 容器，返回格式参数与样本数据
///
/// 跳过 fmt/data 以外的 chunk（如 LIST），只接受线性 PCM
pub fn read_wav(data: &[u8]) -> Result<WavContainer<'_>, WavError> {
    if data.len() < WAV_HEADER_LEN {
        return Err(WavError::TooShort(data.len()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(WavError::MissingTag("RIFF"));
    }
    if &data[8..12] != b"WAVE" {
        return Err(WavError::MissingTag("WAVE"));
    }

    let mut pos = 12;
    let mut format: Option<PcmFormat> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32(data, pos + 4) as usize;
        let body = pos + 8;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || body + 16 > data.len() {
                    return Err(WavError::MissingTag("fmt "));
                }
                let encoding = read_u16(data, body);
                if encoding != 1 {
                    return Err(WavError::UnsupportedEncoding(encoding));
                }
                format = Some(PcmFormat {
                    channels: read_u16(data, body + 2),
                    sample_rate: read_u32(data, body + 4),
                    bits_per_sample: read_u16(data, body + 14),
                });
            }
            b"data" => {
                let format = format.ok_or(WavError::MissingTag("fmt "))?;
                let end = body
                    .checked_add(chunk_size)
                    .filter(|end| *end <= data.len())
                    .ok_or(WavError::TruncatedData)?;
                return Ok(WavContainer {
                    format,
                    samples: &data[body..end],
                });
            }
            _ => {}
        }

        pos = body + chunk_size;
        // 对齐到偶数字节
        if chunk_size % 2 != 0 {
            pos += 1;
        }
    }

    Err(WavError::MissingTag("data"))
}
