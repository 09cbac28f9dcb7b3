//! Binary checkpoint codec.
//!
//! Layout: the 8-byte magic `MDCHKPT\0`, a little-endian `u32` format version, then a
//! bincode-encoded [`Checkpoint`] body. Floating-point values are stored bit-exactly, so a
//! restored simulation continues on the same trajectory as the one that was saved.

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;

pub const MAGIC: [u8; 8] = *b"MDCHKPT\0";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not a checkpoint file (bad magic bytes)")]
    BadMagic,
    #[error("Unsupported checkpoint format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("Failed to decode checkpoint body: {0}")]
    Decode(#[source] bincode::Error),
    #[error("Failed to encode checkpoint body: {0}")]
    Encode(#[source] bincode::Error),
    #[error("Checkpoint holds {found} atoms but the system has {expected}")]
    AtomCountMismatch { expected: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub step: u64,
    /// Simulated time in ps.
    pub time: f64,
    pub atom_count: u64,
    pub positions: Vec<[f64; 3]>,
    pub velocities: Vec<[f64; 3]>,
    /// Orthorhombic box edge lengths in nm, if the system is periodic.
    pub box_lengths: Option<[f64; 3]>,
    pub rng: ChaCha8Rng,
}

impl Checkpoint {
    pub fn write_to(&self, writer: &mut dyn Write) -> Result<(), CheckpointError> {
        writer.write_all(&MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        bincode::serialize_into(&mut *writer, self).map_err(CheckpointError::Encode)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from(reader: &mut dyn Read) -> Result<Self, CheckpointError> {
        let mut magic = [0u8; 8];
        read_header_field(reader, &mut magic)?;
        if magic != MAGIC {
            return Err(CheckpointError::BadMagic);
        }

        let mut version = [0u8; 4];
        read_header_field(reader, &mut version)?;
        let version = u32::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: version,
                expected: FORMAT_VERSION,
            });
        }

        let checkpoint: Checkpoint =
            bincode::deserialize_from(&mut *reader).map_err(CheckpointError::Decode)?;
        checkpoint.check_consistency()?;
        Ok(checkpoint)
    }

    pub fn read_from_path(path: &Path) -> Result<Self, CheckpointError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }

    /// Fails unless the checkpoint describes exactly `atom_count` atoms.
    pub fn expect_atoms(&self, atom_count: usize) -> Result<(), CheckpointError> {
        if self.positions.len() != atom_count {
            return Err(CheckpointError::AtomCountMismatch {
                expected: atom_count,
                found: self.positions.len(),
            });
        }
        Ok(())
    }

    fn check_consistency(&self) -> Result<(), CheckpointError> {
        let declared = usize::try_from(self.atom_count).unwrap_or(usize::MAX);
        if self.positions.len() != declared || self.velocities.len() != declared {
            return Err(CheckpointError::AtomCountMismatch {
                expected: declared,
                found: self.positions.len().min(self.velocities.len()),
            });
        }
        Ok(())
    }
}

// A truncated header means the file is not a checkpoint at all.
fn read_header_field(reader: &mut dyn Read, buf: &mut [u8]) -> Result<(), CheckpointError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => CheckpointError::BadMagic,
        _ => CheckpointError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use std::io::Cursor;

    fn sample() -> Checkpoint {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        rng.next_u64();
        Checkpoint {
            step: 400,
            time: 0.8,
            atom_count: 2,
            positions: vec![[0.1, 0.2, 0.3], [1.0 / 3.0, -0.5, 2.5]],
            velocities: vec![[0.01, -0.02, 0.0], [f64::MIN_POSITIVE, 0.0, -1e-300]],
            box_lengths: Some([3.0, 3.0, 3.0]),
            rng,
        }
    }

    fn encode(checkpoint: &Checkpoint) -> Vec<u8> {
        let mut buf = Vec::new();
        checkpoint.write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn round_trip_is_bit_exact_including_rng_stream() {
        let original = sample();
        let bytes = encode(&original);
        assert_eq!(&bytes[..8], &MAGIC);
        assert_eq!(&bytes[8..12], &FORMAT_VERSION.to_le_bytes());

        let mut restored = Checkpoint::read_from(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(restored, original);

        let mut expected_rng = original.rng.clone();
        assert_eq!(restored.rng.next_u64(), expected_rng.next_u64());
        assert_eq!(encode(&Checkpoint { rng: original.rng.clone(), ..restored }), bytes);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = encode(&sample());
        bytes[0] = b'X';
        assert!(matches!(
            Checkpoint::read_from(&mut Cursor::new(&bytes)),
            Err(CheckpointError::BadMagic)
        ));
    }

    #[test]
    fn empty_and_truncated_files_are_rejected() {
        assert!(matches!(
            Checkpoint::read_from(&mut Cursor::new(Vec::<u8>::new())),
            Err(CheckpointError::BadMagic)
        ));

        let bytes = encode(&sample());
        let truncated = &bytes[..bytes.len() - 10];
        assert!(matches!(
            Checkpoint::read_from(&mut Cursor::new(truncated)),
            Err(CheckpointError::Decode(_))
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut bytes = encode(&sample());
        bytes[8..12].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            Checkpoint::read_from(&mut Cursor::new(&bytes)),
            Err(CheckpointError::UnsupportedVersion { found: 7, expected: 1 })
        ));
    }

    #[test]
    fn inconsistent_atom_count_is_rejected() {
        let mut checkpoint = sample();
        checkpoint.atom_count = 3;
        let bytes = encode(&checkpoint);
        assert!(matches!(
            Checkpoint::read_from(&mut Cursor::new(&bytes)),
            Err(CheckpointError::AtomCountMismatch { expected: 3, found: 2 })
        ));
        assert!(sample().expect_atoms(2).is_ok());
        assert!(matches!(
            sample().expect_atoms(5),
            Err(CheckpointError::AtomCountMismatch { expected: 5, found: 2 })
        ));
    }

    #[test]
    fn read_from_path_reports_missing_file_as_io() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Checkpoint::read_from_path(&dir.path().join("none.chk")),
            Err(CheckpointError::Io(_))
        ));
    }
}
