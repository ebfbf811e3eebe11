//! PCM样本编解码
//!
//! 原始小端PCM字节 ⇄ 归一化f64样本的双向转换，纯函数、无I/O。
//!
//! ## 归一化约定
//!
//! 全库统一使用对称满刻度 `2^(n-1) - 1`（127 / 32767 / 8388607 / 2147483647）
//! 作为解码除数与编码乘数。因此 `encode(1.0)` 与 `encode(-1.0)` 恰好是
//! 正负对称的最大码值，而最负码值（如16位的 -32768）解码后略小于 -1.0。
//!
//! 编码前总是将样本钳位到 [-1.0, 1.0]，随后向零截断，不会发生整数回绕。

use super::format::BitDepth;
use crate::error::AudioResult;

/// 位深度对应的满刻度值（解码除数/编码乘数）
#[inline]
pub fn full_scale(depth: BitDepth) -> f64 {
    match depth {
        BitDepth::U8 => 127.0,
        BitDepth::S16 => 32767.0,
        BitDepth::S24 => 8_388_607.0,
        BitDepth::S32 => 2_147_483_647.0,
    }
}

/// 将样本钳位到 [-1.0, 1.0]；NaN 视为静音
#[inline]
pub fn clamp_sample(sample: f64) -> f64 {
    if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    }
}

/// 解码单个样本（`bytes` 长度必须等于每样本字节数）
#[inline]
fn decode_one(bytes: &[u8], depth: BitDepth) -> f64 {
    let value = match depth {
        BitDepth::U8 => bytes[0] as i32 - 128,
        BitDepth::S16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
        BitDepth::S24 => {
            let raw = bytes[0] as i32 | (bytes[1] as i32) << 8 | (bytes[2] as i32) << 16;
            // 第23位为符号位：手动符号扩展到32位
            if raw & 0x0080_0000 != 0 {
                raw | !0x00FF_FFFF
            } else {
                raw
            }
        }
        BitDepth::S32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    };
    value as f64 / full_scale(depth)
}

/// 编码单个样本并追加到输出
#[inline]
fn encode_one(sample: f64, depth: BitDepth, out: &mut Vec<u8>) {
    let scaled = clamp_sample(sample) * full_scale(depth);
    match depth {
        BitDepth::U8 => out.push((scaled as i32 + 128) as u8),
        BitDepth::S16 => out.extend_from_slice(&(scaled as i16).to_le_bytes()),
        BitDepth::S24 => out.extend_from_slice(&(scaled as i32).to_le_bytes()[..3]),
        BitDepth::S32 => out.extend_from_slice(&(scaled as i32).to_le_bytes()),
    }
}

/// 解码到调用方提供的缓冲区
///
/// 只解码完整样本；尾部不足一个样本的字节被忽略（由调用方负责结转）。
/// 返回写入 `out` 的样本数：`min(bytes.len() / 每样本字节数, out.len())`。
pub fn decode_into(bytes: &[u8], depth: BitDepth, out: &mut [f64]) -> usize {
    let mut written = 0;
    for (slot, chunk) in out
        .iter_mut()
        .zip(bytes.chunks_exact(depth.bytes_per_sample()))
    {
        *slot = decode_one(chunk, depth);
        written += 1;
    }
    written
}

/// 解码全部完整样本
pub fn decode_samples(bytes: &[u8], depth: BitDepth) -> Vec<f64> {
    bytes
        .chunks_exact(depth.bytes_per_sample())
        .map(|chunk| decode_one(chunk, depth))
        .collect()
}

/// 编码并追加到输出缓冲区（先钳位再缩放）
pub fn encode_into(samples: &[f64], depth: BitDepth, out: &mut Vec<u8>) {
    out.reserve(samples.len() * depth.bytes_per_sample());
    for &sample in samples {
        encode_one(sample, depth, out);
    }
}

/// 编码为新的字节缓冲区
pub fn encode_samples(samples: &[f64], depth: BitDepth) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * depth.bytes_per_sample());
    encode_into(samples, depth, &mut out);
    out
}

/// 以原始位数解码（在任何运算之前校验位深度）
pub fn decode_pcm(bytes: &[u8], bits_per_sample: u16) -> AudioResult<Vec<f64>> {
    let depth = BitDepth::try_from(bits_per_sample)?;
    Ok(decode_samples(bytes, depth))
}

/// 以原始位数编码（在任何运算之前校验位深度）
pub fn encode_pcm(samples: &[f64], bits_per_sample: u16) -> AudioResult<Vec<u8>> {
    let depth = BitDepth::try_from(bits_per_sample)?;
    Ok(encode_samples(samples, depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AudioError;

    fn ramp(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| -1.0 + 2.0 * i as f64 / (count - 1) as f64)
            .collect()
    }

    #[test]
    fn test_round_trip_all_depths() {
        let samples = ramp(257);
        for depth in BitDepth::ALL {
            let bytes = encode_samples(&samples, depth);
            assert_eq!(bytes.len(), samples.len() * depth.bytes_per_sample());

            let decoded = decode_samples(&bytes, depth);
            let tolerance = 1.0 / full_scale(depth);
            for (orig, back) in samples.iter().zip(&decoded) {
                assert!(
                    (orig - back).abs() <= tolerance,
                    "{}位往返误差过大: {orig} -> {back}",
                    depth.bits()
                );
            }
        }
    }

    #[test]
    fn test_s16_reference_values() {
        let samples = [0.0, 0.5, -0.5, 1.0, -1.0];
        let bytes = encode_samples(&samples, BitDepth::S16);
        let values: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(values, vec![0, 16383, -16383, 32767, -32767]);

        let decoded = decode_samples(&bytes, BitDepth::S16);
        for (orig, back) in samples.iter().zip(&decoded) {
            assert!((orig - back).abs() <= 1.0 / 32767.0);
        }
    }

    #[test]
    fn test_clamping_never_wraps() {
        for depth in BitDepth::ALL {
            let hot = encode_samples(&[2.0, -2.0, f64::INFINITY, f64::NEG_INFINITY], depth);
            let unit = encode_samples(&[1.0, -1.0, 1.0, -1.0], depth);
            assert_eq!(hot, unit, "{}位钳位失败", depth.bits());

            let decoded = decode_samples(&hot, depth);
            assert_eq!(decoded[0], 1.0);
            assert_eq!(decoded[1], -1.0);
        }
    }

    #[test]
    fn test_nan_encodes_as_silence() {
        let bytes = encode_samples(&[f64::NAN], BitDepth::S16);
        assert_eq!(bytes, vec![0, 0]);
        let bytes = encode_samples(&[f64::NAN], BitDepth::U8);
        assert_eq!(bytes, vec![128]);
    }

    #[test]
    fn test_u8_offset_binary() {
        let decoded = decode_samples(&[128, 255, 1, 0], BitDepth::U8);
        assert_eq!(decoded[0], 0.0);
        assert_eq!(decoded[1], 1.0);
        assert_eq!(decoded[2], -1.0);
        assert!((decoded[3] - (-128.0 / 127.0)).abs() < 1e-12);

        assert_eq!(encode_samples(&[0.0, 1.0, -1.0], BitDepth::U8), vec![128, 255, 1]);
    }

    #[test]
    fn test_s24_sign_extension() {
        // 0xFFFFFF = -1, 0x800000 = -8388608, 0x7FFFFF = 8388607
        let bytes = [0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x80, 0xFF, 0xFF, 0x7F];
        let decoded = decode_samples(&bytes, BitDepth::S24);
        assert!((decoded[0] - (-1.0 / 8_388_607.0)).abs() < 1e-15);
        assert!((decoded[1] - (-8_388_608.0 / 8_388_607.0)).abs() < 1e-15);
        assert_eq!(decoded[2], 1.0);

        let encoded = encode_samples(&[-1.0], BitDepth::S24);
        assert_eq!(encoded, vec![0x01, 0x00, 0x80]);
    }

    #[test]
    fn test_s32_extremes() {
        let bytes = encode_samples(&[1.0, -1.0], BitDepth::S32);
        assert_eq!(&bytes[..4], &i32::MAX.to_le_bytes());
        assert_eq!(&bytes[4..], &(-i32::MAX).to_le_bytes());
    }

    #[test]
    fn test_partial_trailing_bytes_ignored() {
        let decoded = decode_samples(&[0x00, 0x40, 0x12], BitDepth::S16);
        assert_eq!(decoded.len(), 1);

        let mut out = [9.0; 4];
        let written = decode_into(&[0x00, 0x40, 0x00, 0xC0, 0x55], BitDepth::S16, &mut out);
        assert_eq!(written, 2);
        assert_eq!(out[2], 9.0);
    }

    #[test]
    fn test_decode_into_respects_output_length() {
        let bytes = encode_samples(&[0.1, 0.2, 0.3], BitDepth::S16);
        let mut out = [0.0; 2];
        assert_eq!(decode_into(&bytes, BitDepth::S16, &mut out), 2);
    }

    #[test]
    fn test_raw_entry_points_validate_depth() {
        assert!(matches!(
            decode_pcm(&[0, 0], 12),
            Err(AudioError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            encode_pcm(&[0.0], 20),
            Err(AudioError::UnsupportedFormat(_))
        ));
        assert_eq!(encode_pcm(&[0.0], 16).unwrap(), vec![0, 0]);
    }
}
