//! WAV容器
//!
//! 规范44字节PCM头（RIFF/WAVE/"fmt "/"data"，无扩展块）的构建与解析，
//! 以及整文件读写和可回填大小的流式写入器。
//!
//! 布局（全部小端序）：
//!
//! ```text
//!  0 "RIFF"  4 chunk_size=36+data  8 "WAVE"
//! 12 "fmt " 16 16  20 format=1  22 channels  24 sample_rate
//! 28 byte_rate  32 block_align  34 bits_per_sample
//! 36 "data" 40 data_size  44 ...payload
//! ```

use super::buffer::SampleBuffer;
use super::codec;
use super::format::PcmParams;
use crate::error::{self, AudioError, AudioResult};
use crate::tools::constants::wav_limits::MAX_SKIPPED_CHUNK;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// 规范WAV头长度
pub const HEADER_LEN: usize = 44;

/// RIFF块大小中除data负载外的固定部分
const RIFF_OVERHEAD: u32 = 36;

const FORMAT_PCM: u16 = 1;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// 规范PCM WAV头
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavHeader {
    pub params: PcmParams,
    /// data块负载字节数
    pub data_size: u32,
}

impl WavHeader {
    /// 创建WAV头；`data_size` 必须能放入RIFF的32位大小字段，
    /// 块对齐与字节率必须能放入fmt块的16位/32位字段
    pub fn new(params: PcmParams, data_size: usize) -> AudioResult<Self> {
        if u16::try_from(params.bytes_per_frame()).is_err() {
            return Err(error::config_error(
                "block align exceeds WAV limit / 块对齐超出WAV上限",
                params.bytes_per_frame(),
            ));
        }
        if u32::try_from(params.byte_rate()).is_err() {
            return Err(error::config_error(
                "byte rate exceeds WAV limit / 字节率超出WAV上限",
                params.byte_rate(),
            ));
        }

        let data_size = u32::try_from(data_size)
            .ok()
            .filter(|size| *size <= u32::MAX - RIFF_OVERHEAD)
            .ok_or_else(|| {
                error::framing_error("data size exceeds WAV limit / 数据超出WAV上限", data_size)
            })?;
        Ok(Self { params, data_size })
    }

    /// RIFF块大小 = 36 + data_size
    pub fn riff_chunk_size(&self) -> u32 {
        RIFF_OVERHEAD + self.data_size
    }

    /// 块对齐 = 声道数 × 位深/8
    pub fn block_align(&self) -> u16 {
        self.params.bytes_per_frame() as u16
    }

    /// 字节率 = 采样率 × 块对齐
    pub fn byte_rate(&self) -> u32 {
        self.params.byte_rate() as u32
    }

    /// 负载中的完整帧数
    pub fn frame_count(&self) -> u64 {
        self.data_size as u64 / self.block_align() as u64
    }

    /// 序列化为44字节
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&self.riff_chunk_size().to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");
        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&16u32.to_le_bytes());
        header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
        header[22..24].copy_from_slice(&self.params.channels().to_le_bytes());
        header[24..28].copy_from_slice(&self.params.sample_rate().to_le_bytes());
        header[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        header[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        header[34..36].copy_from_slice(&self.params.bit_depth().bits().to_le_bytes());
        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        header
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// 解析完整WAV文件的头部，并校验声明大小与实际剩余长度一致
    ///
    /// 拒绝：魔数/块ID错误、fmt块大小不是16、非PCM格式、
    /// 字节率/块对齐不自洽、data大小未按帧对齐、RIFF大小 ≠ 36 + data、
    /// data大小 ≠ 实际负载长度。
    pub fn parse(file: &[u8]) -> AudioResult<Self> {
        let header = Self::parse_prefix(file)?;

        let payload_len = file.len() - HEADER_LEN;
        if header.data_size as usize != payload_len {
            return Err(error::framing_error(
                "data size mismatch / data大小与负载长度不一致",
                format!("declared {}, actual {payload_len}", header.data_size),
            ));
        }
        Ok(header)
    }

    /// 只解析前44字节的结构，不比较大小与文件长度
    pub fn parse_prefix(bytes: &[u8]) -> AudioResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(error::framing_error(
                "truncated WAV header / WAV头被截断",
                format!("{} of {HEADER_LEN} bytes", bytes.len()),
            ));
        }

        expect_tag(bytes, 0, b"RIFF")?;
        expect_tag(bytes, 8, b"WAVE")?;
        expect_tag(bytes, 12, b"fmt ")?;
        expect_tag(bytes, 36, b"data")?;

        let fmt_size = le_u32(bytes, 16);
        if fmt_size != 16 {
            return Err(error::framing_error(
                "unexpected fmt chunk size / fmt块大小异常",
                fmt_size,
            ));
        }

        let params = parse_fmt_body(&bytes[20..36])?;
        let data_size = le_u32(bytes, 40);
        let header = Self::new(params, data_size as usize)?;

        if data_size % u32::from(header.block_align()) != 0 {
            return Err(error::framing_error(
                "data size not frame-aligned / data大小未按帧对齐",
                format!("{data_size} % {}", header.block_align()),
            ));
        }

        let riff_size = le_u32(bytes, 4);
        if riff_size != header.riff_chunk_size() {
            return Err(error::framing_error(
                "RIFF size mismatch / RIFF大小不一致",
                format!("declared {riff_size}, expected {}", header.riff_chunk_size()),
            ));
        }
        Ok(header)
    }
}

/// 解码器输出流的头部信息
///
/// 流式输出往往无法预知长度，大小字段可能是占位值，因此只作参考。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub params: PcmParams,
    /// 声明的data大小（可能是占位值）
    pub declared_data_size: u32,
    /// data负载之前消耗的字节数（规范布局下为44）
    pub header_len: usize,
}

impl StreamHeader {
    /// 可信的data大小；0与0xFFFFFFFF是管道写出的占位值，返回None表示读到EOF为止
    pub fn known_data_size(&self) -> Option<u32> {
        match self.declared_data_size {
            0 | u32::MAX => None,
            size => Some(size),
        }
    }
}

/// 从流中读取WAV前导部分，停在data负载的第一个字节
///
/// 允许fmt为扩展格式以及fmt与data之间出现其它块（如LIST），
/// 对规范布局恰好消耗44字节。流在data块之前结束即为分帧错误。
pub fn read_stream_header<R: Read>(reader: &mut R) -> AudioResult<StreamHeader> {
    let mut preamble = [0u8; 12];
    read_header_bytes(reader, &mut preamble)?;
    expect_tag(&preamble, 0, b"RIFF")?;
    expect_tag(&preamble, 8, b"WAVE")?;

    let mut consumed = preamble.len();
    let mut params = None;

    loop {
        let mut chunk = [0u8; 8];
        read_header_bytes(reader, &mut chunk)?;
        consumed += chunk.len();
        let size = le_u32(&chunk, 4);

        match &chunk[0..4] {
            b"data" => {
                let params = params.ok_or_else(|| {
                    error::framing_error("data chunk before fmt / data块出现在fmt之前", "")
                })?;
                return Ok(StreamHeader {
                    params,
                    declared_data_size: size,
                    header_len: consumed,
                });
            }
            id => {
                if size > MAX_SKIPPED_CHUNK {
                    return Err(error::framing_error(
                        "oversized header chunk / 头部块过大",
                        format!("{} ({size} bytes)", String::from_utf8_lossy(id)),
                    ));
                }
                // RIFF块按偶数字节对齐
                let padded = size as usize + (size as usize & 1);
                let mut body = vec![0u8; padded];
                read_header_bytes(reader, &mut body)?;
                consumed += padded;

                if id == b"fmt " {
                    if body.len() < 16 {
                        return Err(error::framing_error(
                            "fmt chunk too short / fmt块过短",
                            body.len(),
                        ));
                    }
                    params = Some(parse_fmt_body(&body[..16])?);
                }
            }
        }
    }
}

/// 写入规范WAV头
pub fn write_header<W: Write>(writer: &mut W, params: PcmParams, data_size: usize) -> AudioResult<()> {
    WavHeader::new(params, data_size)?.write_to(writer)?;
    Ok(())
}

/// 写入完整WAV：头部大小为所有分块长度之和，随后按顺序写出每个分块
pub fn write_wav<W, B>(writer: &mut W, params: PcmParams, chunks: &[B]) -> AudioResult<()>
where
    W: Write,
    B: AsRef<[u8]>,
{
    let data_size = chunks.iter().map(|chunk| chunk.as_ref().len()).sum();
    write_header(writer, params, data_size)?;
    for chunk in chunks {
        writer.write_all(chunk.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}

/// 写入WAV文件，返回写入的总字节数
pub fn write_wav_file<P, B>(path: P, params: PcmParams, chunks: &[B]) -> AudioResult<u64>
where
    P: AsRef<Path>,
    B: AsRef<[u8]>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_wav(&mut writer, params, chunks)?;

    let file = writer.into_inner().map_err(|e| AudioError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}

/// 将样本缓冲区编码为完整的WAV字节
pub fn encode_wav(buffer: &SampleBuffer) -> AudioResult<Vec<u8>> {
    let params = buffer.params();
    let payload = codec::encode_samples(buffer.samples(), params.bit_depth());

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    write_wav(&mut bytes, params, &[payload])?;
    Ok(bytes)
}

/// 解析并解码完整WAV字节
pub fn decode_wav(bytes: &[u8]) -> AudioResult<SampleBuffer> {
    let header = WavHeader::parse(bytes)?;
    let samples = codec::decode_samples(&bytes[HEADER_LEN..], header.params.bit_depth());
    Ok(SampleBuffer::new(samples, header.params))
}

/// 读取并解码WAV文件
pub fn read_wav_file<P: AsRef<Path>>(path: P) -> AudioResult<SampleBuffer> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_wav(&bytes)
}

/// 流式WAV写入器
///
/// 先写入大小为0的临时头，追加负载，`finish()` 时回填两个大小字段。
pub struct WavStreamWriter<W: Write + Seek> {
    writer: W,
    params: PcmParams,
    data_size: u64,
}

impl<W: Write + Seek> WavStreamWriter<W> {
    pub fn new(mut writer: W, params: PcmParams) -> AudioResult<Self> {
        write_header(&mut writer, params, 0)?;
        Ok(Self {
            writer,
            params,
            data_size: 0,
        })
    }

    /// 追加一段原始PCM负载
    pub fn write_frame(&mut self, bytes: &[u8]) -> AudioResult<()> {
        let new_size = self.data_size + bytes.len() as u64;
        if new_size > (u32::MAX - RIFF_OVERHEAD) as u64 {
            return Err(error::framing_error(
                "data size exceeds WAV limit / 数据超出WAV上限",
                new_size,
            ));
        }
        self.writer.write_all(bytes)?;
        self.data_size = new_size;
        Ok(())
    }

    /// 编码并追加样本
    pub fn write_samples(&mut self, samples: &[f64]) -> AudioResult<()> {
        let bytes = codec::encode_samples(samples, self.params.bit_depth());
        self.write_frame(&bytes)
    }

    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// 回填头部大小并刷新，返回底层写入器
    pub fn finish(mut self) -> AudioResult<W> {
        let header = WavHeader::new(self.params, self.data_size as usize)?;
        self.writer.seek(SeekFrom::Start(0))?;
        header.write_to(&mut self.writer)?;
        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn parse_fmt_body(body: &[u8]) -> AudioResult<PcmParams> {
    let format_tag = le_u16(body, 0);
    if format_tag != FORMAT_PCM && format_tag != FORMAT_EXTENSIBLE {
        return Err(error::framing_error(
            "not a PCM WAV / 非PCM格式",
            format!("format tag {format_tag:#06x}"),
        ));
    }

    let channels = le_u16(body, 2);
    let sample_rate = le_u32(body, 4);
    let byte_rate = le_u32(body, 8);
    let block_align = le_u16(body, 12);
    let bits = le_u16(body, 14);

    let params = PcmParams::new(sample_rate, channels, bits)?;
    if block_align as usize != params.bytes_per_frame() || byte_rate as u64 != params.byte_rate() {
        return Err(error::framing_error(
            "inconsistent fmt chunk / fmt块字段不自洽",
            format!("byte_rate {byte_rate}, block_align {block_align}"),
        ));
    }
    Ok(params)
}

/// 读取头部字节；提前EOF转换为分帧错误
fn read_header_bytes<R: Read>(reader: &mut R, buf: &mut [u8]) -> AudioResult<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            error::framing_error("truncated WAV header / WAV头被截断", e)
        }
        _ => AudioError::Io(e),
    })
}

fn expect_tag(bytes: &[u8], offset: usize, tag: &[u8; 4]) -> AudioResult<()> {
    let found = &bytes[offset..offset + 4];
    if found != tag {
        return Err(error::framing_error(
            "bad chunk id / 块标识错误",
            format!(
                "expected {:?} at {offset}, found {:?}",
                String::from_utf8_lossy(tag),
                String::from_utf8_lossy(found)
            ),
        ));
    }
    Ok(())
}

fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn le_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn params(rate: u32, channels: u16, bits: u16) -> PcmParams {
        PcmParams::new(rate, channels, bits).unwrap()
    }

    #[test]
    fn test_header_layout() {
        let header = WavHeader::new(params(16000, 1, 16), 3200).unwrap();
        let bytes = header.to_bytes();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(le_u32(&bytes, 4), 36 + 3200);
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(le_u32(&bytes, 16), 16);
        assert_eq!(le_u16(&bytes, 20), 1);
        assert_eq!(le_u16(&bytes, 22), 1);
        assert_eq!(le_u32(&bytes, 24), 16000);
        assert_eq!(le_u32(&bytes, 28), 32000);
        assert_eq!(le_u16(&bytes, 32), 2);
        assert_eq!(le_u16(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(le_u32(&bytes, 40), 3200);
    }

    #[test]
    fn test_header_round_trip() {
        for (rate, channels, bits, data) in [
            (8000, 1, 8, 0usize),
            (44100, 2, 16, 4),
            (48000, 6, 24, 18 * 7),
            (96000, 2, 32, 8 * 1000),
        ] {
            let p = params(rate, channels, bits);
            let mut file = WavHeader::new(p, data).unwrap().to_bytes().to_vec();
            file.resize(HEADER_LEN + data, 0);

            let parsed = WavHeader::parse(&file).unwrap();
            assert_eq!(parsed.params, p);
            assert_eq!(parsed.data_size as usize, data);
            assert_eq!(parsed.riff_chunk_size() as usize, 36 + data);
        }
    }

    #[test]
    fn test_parse_rejects_inconsistent_sizes() {
        let p = params(16000, 1, 16);
        let mut file = WavHeader::new(p, 10).unwrap().to_bytes().to_vec();
        file.extend_from_slice(&[0; 8]);
        assert!(matches!(WavHeader::parse(&file), Err(AudioError::Framing(_))));

        let mut file = WavHeader::new(p, 4).unwrap().to_bytes().to_vec();
        file.extend_from_slice(&[0; 4]);
        file[4..8].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(WavHeader::parse(&file), Err(AudioError::Framing(_))));
    }

    #[test]
    fn test_parse_rejects_partial_trailing_frame() {
        // 立体声16位：块对齐4，7字节负载多出3字节
        let p = params(44100, 2, 16);
        let mut file = WavHeader::new(p, 7).unwrap().to_bytes().to_vec();
        file.extend_from_slice(&[0; 7]);
        assert!(matches!(WavHeader::parse(&file), Err(AudioError::Framing(_))));
        assert!(matches!(decode_wav(&file), Err(AudioError::Framing(_))));

        let mut file = WavHeader::new(p, 8).unwrap().to_bytes().to_vec();
        file.extend_from_slice(&[0; 8]);
        assert_eq!(decode_wav(&file).unwrap().len(), 4);
    }

    #[test]
    fn test_new_rejects_fields_wider_than_fmt_chunk() {
        // 20000声道 × 4字节 = 80000，超出u16块对齐
        let wide = params(48000, 20000, 32);
        assert!(matches!(WavHeader::new(wide, 0), Err(AudioError::InvalidConfig(_))));

        // 字节率 = u32::MAX × 8，超出u32
        let fast = params(u32::MAX, 2, 32);
        assert!(matches!(WavHeader::new(fast, 0), Err(AudioError::InvalidConfig(_))));

        let mut out = Vec::new();
        assert!(matches!(
            write_wav::<_, Vec<u8>>(&mut out, wide, &[]),
            Err(AudioError::InvalidConfig(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_widest_block_align_round_trips() {
        // 16383 × 4 = 65532，恰好放得下u16；字节率约3.1e9，放得下u32
        let p = params(48000, 16383, 32);
        let header = WavHeader::new(p, 65532).unwrap();
        assert_eq!(header.block_align(), 65532);
        assert_eq!(u64::from(header.byte_rate()), 48000 * 65532);

        let mut file = header.to_bytes().to_vec();
        file.resize(HEADER_LEN + 65532, 0);
        let parsed = WavHeader::parse(&file).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.frame_count(), 1);
    }

    #[test]
    fn test_placeholder_data_sizes_are_unknown() {
        let p = params(44100, 2, 16);
        for (declared, known) in [(0, None), (u32::MAX, None), (4096, Some(4096))] {
            let mut bytes = WavHeader::new(p, 0).unwrap().to_bytes();
            bytes[40..44].copy_from_slice(&declared.to_le_bytes());
            let header = read_stream_header(&mut bytes.as_slice()).unwrap();
            assert_eq!(header.known_data_size(), known);
        }
    }

    #[test]
    fn test_parse_rejects_bad_magic_and_format() {
        let p = params(16000, 1, 16);
        let good = WavHeader::new(p, 0).unwrap().to_bytes();

        let mut bad = good;
        bad[0..4].copy_from_slice(b"RIFX");
        assert!(WavHeader::parse(&bad).is_err());

        let mut bad = good;
        bad[36..40].copy_from_slice(b"LIST");
        assert!(WavHeader::parse(&bad).is_err());

        let mut bad = good;
        bad[20..22].copy_from_slice(&3u16.to_le_bytes());
        assert!(WavHeader::parse(&bad).is_err());

        let mut bad = good;
        bad[32..34].copy_from_slice(&4u16.to_le_bytes());
        assert!(WavHeader::parse(&bad).is_err());

        let mut bad = good;
        bad[34..36].copy_from_slice(&12u16.to_le_bytes());
        assert!(matches!(
            WavHeader::parse(&bad),
            Err(AudioError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            WavHeader::parse(&good[..30]),
            Err(AudioError::Framing(_))
        ));
    }

    #[test]
    fn test_empty_wav_is_44_bytes() {
        let mut out = Vec::new();
        write_wav::<_, Vec<u8>>(&mut out, params(16000, 1, 16), &[]).unwrap();
        assert_eq!(out.len(), HEADER_LEN);
        assert_eq!(le_u32(&out, 40), 0);
        assert_eq!(WavHeader::parse(&out).unwrap().data_size, 0);
    }

    #[test]
    fn test_write_wav_sums_chunks() {
        let chunks = vec![vec![1u8, 2, 3, 4], vec![5, 6]];
        let mut out = Vec::new();
        write_wav(&mut out, params(8000, 1, 16), &chunks).unwrap();

        let header = WavHeader::parse(&out).unwrap();
        assert_eq!(header.data_size, 6);
        assert_eq!(&out[HEADER_LEN..], &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_encode_decode_wav() {
        let p = params(22050, 2, 24);
        let buffer = SampleBuffer::new(vec![0.0, 0.25, -0.25, 0.75], p);
        let bytes = encode_wav(&buffer).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 4 * 3);

        let decoded = decode_wav(&bytes).unwrap();
        assert_eq!(decoded.params(), p);
        for (a, b) in buffer.samples().iter().zip(decoded.samples()) {
            assert!((a - b).abs() <= 1.0 / 8_388_607.0);
        }
    }

    #[test]
    fn test_stream_writer_backfills_sizes() {
        let p = params(8000, 2, 16);
        let mut writer = WavStreamWriter::new(Cursor::new(Vec::new()), p).unwrap();
        writer.write_frame(&[0; 8]).unwrap();
        writer.write_samples(&[0.5, -0.5]).unwrap();
        assert_eq!(writer.data_size(), 12);

        let bytes = writer.finish().unwrap().into_inner();
        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.data_size, 12);
        assert_eq!(header.frame_count(), 3);
    }

    #[test]
    fn test_read_stream_header_canonical() {
        let p = params(16000, 1, 16);
        let mut stream = WavHeader::new(p, 0).unwrap().to_bytes().to_vec();
        stream.extend_from_slice(&[7, 7]);

        let mut cursor = Cursor::new(stream);
        let header = read_stream_header(&mut cursor).unwrap();
        assert_eq!(header.params, p);
        assert_eq!(header.header_len, HEADER_LEN);
        assert_eq!(cursor.position(), HEADER_LEN as u64);
    }

    #[test]
    fn test_read_stream_header_skips_extra_chunks() {
        let p = params(48000, 2, 24);
        let canonical = WavHeader::new(p, 0).unwrap().to_bytes();

        // RIFF/WAVE + fmt + LIST(奇数长度) + data
        let mut stream = canonical[..36].to_vec();
        stream.extend_from_slice(b"LIST");
        stream.extend_from_slice(&3u32.to_le_bytes());
        stream.extend_from_slice(&[1, 2, 3, 0]);
        stream.extend_from_slice(&canonical[36..]);

        let header = read_stream_header(&mut Cursor::new(stream)).unwrap();
        assert_eq!(header.params, p);
        assert_eq!(header.header_len, HEADER_LEN + 12);
    }

    #[test]
    fn test_read_stream_header_truncated() {
        let bytes = WavHeader::new(params(16000, 1, 16), 0).unwrap().to_bytes();
        let result = read_stream_header(&mut Cursor::new(&bytes[..40]));
        assert!(matches!(result, Err(AudioError::Framing(_))));
    }
}
