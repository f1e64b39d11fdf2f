//! Wire format of the command stream.
//!
//! Every record is eight little-endian 16-bit words: the five channel
//! words B, A, Z, Y, X, a tag word and two auxiliary words.

use static_assertions::const_assert_eq;

pub const RECORD_WORDS: usize = 8;
pub const RECORD_SIZE: usize = 16;

const_assert_eq!(RECORD_SIZE, RECORD_WORDS * std::mem::size_of::<u16>());

/// Channel code of the centered, idle head
pub const NEUTRAL_CODE: u16 = 0x8000;

const TAG_INDEX: usize = 5;

/// Marker placed in the first word of the frequency bracket records
const FREQUENCY_BRACKET_WORD: u16 = 0x00AA;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Tag
{
    Jump = 0x0000,
    Process = 0x00FF,
    Begin = 0xFF00,
    End = 0x1100,
    FrequencyStart = 0xAA00,
    FrequencyEnd = 0x5500,
    Power = 0xBB00
}

impl Tag
{
    pub fn from_word(word: u16) -> Option<Tag>
    {
        match word {
            0x0000 => Some(Tag::Jump),
            0x00FF => Some(Tag::Process),
            0xFF00 => Some(Tag::Begin),
            0x1100 => Some(Tag::End),
            0xAA00 => Some(Tag::FrequencyStart),
            0x5500 => Some(Tag::FrequencyEnd),
            0xBB00 => Some(Tag::Power),
            _ => None
        }
    }
}

/// One 16 byte command record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record
{
    pub words: [u16; RECORD_WORDS]
}

impl Record
{
    pub const PADDING: Record = Record{words: [0; RECORD_WORDS]};

    /// Motion sample. Channels are given X first but stored B first.
    pub fn sample(tag: Tag, x: u16, y: u16, z: u16, a: u16, b: u16) -> Record
    {
        Record{words: [b, a, z, y, x, tag as u16, 0, 0]}
    }

    pub fn marker(tag: Tag) -> Record
    {
        let mut words = [0; RECORD_WORDS];
        words[TAG_INDEX] = tag as u16;
        Record{words}
    }

    pub fn frequency_start() -> Record
    {
        let mut r = Record::marker(Tag::FrequencyStart);
        r.words[0] = FREQUENCY_BRACKET_WORD;
        r
    }

    pub fn frequency_end() -> Record
    {
        let mut r = Record::marker(Tag::FrequencyEnd);
        r.words[0] = FREQUENCY_BRACKET_WORD;
        r
    }

    /// Pulse count carried between the frequency brackets.
    pub fn frequency_count(count: u32) -> Record
    {
        let mut words = [0; RECORD_WORDS];
        words[0] = (count & 0xFFFF) as u16;
        words[1] = (count >> 16) as u16;
        Record{words}
    }

    pub fn power(code: u16, aux: u16) -> Record
    {
        Record{words: [code, 0, 0, 0, 0, Tag::Power as u16, 0, aux]}
    }

    pub fn tag(&self) -> Option<Tag>
    {
        Tag::from_word(self.words[TAG_INDEX])
    }

    /// (X, Y, Z) channel codes
    pub fn xyz(&self) -> (u16, u16, u16)
    {
        (self.words[4], self.words[3], self.words[2])
    }

    pub fn is_padding(&self) -> bool
    {
        *self == Record::PADDING
    }

    /// Writes the record into the first `RECORD_SIZE` bytes of `out`.
    pub fn encode(&self, out: &mut [u8])
    {
        for (w, chunk) in self.words.iter().zip(out[..RECORD_SIZE].chunks_exact_mut(2)) {
            chunk.copy_from_slice(&w.to_le_bytes());
        }
    }

    pub fn decode(bytes: &[u8]) -> Record
    {
        let mut words = [0; RECORD_WORDS];
        for (w, chunk) in words.iter_mut().zip(bytes[..RECORD_SIZE].chunks_exact(2)) {
            *w = u16::from_le_bytes([chunk[0], chunk[1]]);
        }
        Record{words}
    }
}

/// Splits a byte stream into records, dropping zero padding.
pub fn decode_stream(bytes: &[u8]) -> Vec<Record>
{
    bytes.chunks_exact(RECORD_SIZE)
        .map(Record::decode)
        .filter(|r| !r.is_padding())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_layout() {
        let r = Record::sample(Tag::Process, 1, 2, 3, 4, 5);
        let mut bytes = [0u8; RECORD_SIZE];
        r.encode(&mut bytes);
        assert_eq!(bytes, [5, 0, 4, 0, 3, 0, 2, 0, 1, 0, 0xFF, 0, 0, 0, 0, 0]);
        assert_eq!(r.xyz(), (1, 2, 3));
        assert_eq!(r.tag(), Some(Tag::Process));
    }

    #[test]
    fn test_frequency_count_words() {
        let r = Record::frequency_count(0x0003_0D40);
        assert_eq!(r.words, [0x0D40, 0x0003, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_markers() {
        assert_eq!(Record::marker(Tag::Begin).words, [0, 0, 0, 0, 0, 0xFF00, 0, 0]);
        assert_eq!(Record::frequency_end().words, [0xAA, 0, 0, 0, 0, 0x5500, 0, 0]);
        assert_eq!(Record::power(7, 11451).words, [7, 0, 0, 0, 0, 0xBB00, 0, 11451]);
        assert_eq!(Tag::from_word(0x1234), None);
    }

    #[test]
    fn test_decode_stream_skips_padding() {
        let mut bytes = vec![0u8; RECORD_SIZE * 3];
        Record::marker(Tag::End).encode(&mut bytes[RECORD_SIZE..]);
        let records = decode_stream(&bytes);
        assert_eq!(records, vec![Record::marker(Tag::End)]);
    }
}
