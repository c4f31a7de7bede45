//! Layer z-position calibration files.
//!
//! The file is a whitespace-separated list of `<layer> <z>` pairs. Line
//! breaks carry no meaning; a later entry for the same layer replaces an
//! earlier one.

use std::path::Path;

use showershape_core::LayerPositions;

use crate::{Error, Result};

/// Parses a layer-position table from text.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] on a malformed layer index, a
/// malformed or non-finite z value, or a layer without a z value.
pub fn parse_layer_positions(text: &str) -> Result<LayerPositions> {
    let mut positions = LayerPositions::new();
    let mut tokens = text.split_whitespace();

    while let Some(layer_token) = tokens.next() {
        let layer: u32 = layer_token.parse().map_err(|_| {
            Error::InvalidFormat(format!("invalid layer index {layer_token:?}"))
        })?;
        let z_token = tokens.next().ok_or_else(|| {
            Error::InvalidFormat(format!("layer {layer} has no z position"))
        })?;
        let z: f64 = z_token
            .parse()
            .ok()
            .filter(|z: &f64| z.is_finite())
            .ok_or_else(|| {
                Error::InvalidFormat(format!("invalid z position {z_token:?} for layer {layer}"))
            })?;
        positions.insert(layer, z);
    }

    Ok(positions)
}

/// Reads a layer-position table from a file.
///
/// # Errors
/// Returns an error if the file cannot be read or is malformed.
pub fn read_layer_positions<P: AsRef<Path>>(path: P) -> Result<LayerPositions> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let positions = parse_layer_positions(&text)?;
    log::info!(
        "loaded z positions for {} layers from {}",
        positions.len(),
        path.display()
    );
    Ok(positions)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_pairs() {
        let positions = parse_layer_positions("1 0.0\n2 5.9\t3 11.8\n\n 4   17.7 ").unwrap();
        assert_eq!(positions.len(), 4);
        assert_relative_eq!(positions.z(3).unwrap(), 11.8);
        assert_relative_eq!(positions.z(4).unwrap(), 17.7);
    }

    #[test]
    fn test_later_entry_wins() {
        let positions = parse_layer_positions("1 0.0 1 2.5").unwrap();
        assert_eq!(positions.len(), 1);
        assert_relative_eq!(positions.z(1).unwrap(), 2.5);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_layer_positions("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_input() {
        for text in ["1 0.0 2", "x 1.0", "-1 2.0", "1 abc", "1 nan", "1.5 2.0"] {
            let err = parse_layer_positions(text).unwrap_err();
            assert!(matches!(err, Error::InvalidFormat(_)), "{text}: {err}");
        }
    }

    #[test]
    fn test_read_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1 0.0").unwrap();
        writeln!(file, "2 5.9").unwrap();
        let positions = read_layer_positions(file.path()).unwrap();
        assert_eq!(positions.iter().collect::<Vec<_>>(), vec![(1, 0.0), (2, 5.9)]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_layer_positions(dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
