use crate::board::Board;
use std::fs;
use std::io;
use thiserror::Error;

/// Error type for level parsing operations.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid level: {0}")]
    InvalidLevel(String),
}

impl From<String> for LevelError {
    fn from(err: String) -> Self {
        LevelError::InvalidLevel(err)
    }
}

/// One level of a collection: its board and its name from the collection
/// file (or `level N` when the file gives none).
#[derive(Debug)]
pub struct Level {
    pub name: String,
    pub board: Board,
}

/// A collection of Sokoban levels in XSB format.
#[derive(Debug)]
pub struct Levels {
    levels: Vec<Level>,
}

impl Levels {
    /// Parse XSB-formatted Sokoban levels from a string.
    ///
    /// The XSB format uses:
    /// - Lines starting with `;` as level separators; text after the `;`
    ///   names the following level
    /// - Standard Sokoban characters (#, @, $, ., *, +, space)
    /// - Empty lines between levels (optional)
    pub fn from_text(contents: &str) -> Result<Self, LevelError> {
        let mut levels: Vec<Level> = Vec::new();
        let mut current = String::new();
        let mut pending_name: Option<String> = None;

        for line in contents.lines() {
            // Comment lines separate levels and may carry the next name.
            if line.trim_start().starts_with(';') {
                if !current.is_empty() {
                    levels.push(build_level(&current, pending_name.take(), levels.len())?);
                    current.clear();
                }
                let name = line.trim_start().trim_start_matches(';').trim();
                if !name.is_empty() {
                    pending_name = Some(name.to_string());
                }
                continue;
            }

            if line.is_empty() {
                if !current.is_empty() {
                    levels.push(build_level(&current, pending_name.take(), levels.len())?);
                    current.clear();
                }
                continue;
            }

            current.push_str(line);
            current.push('\n');
        }

        // Don't forget the last level if the file doesn't end with an
        // empty line.
        if !current.is_empty() {
            levels.push(build_level(&current, pending_name.take(), levels.len())?);
        }

        Ok(Levels { levels })
    }

    /// Parse XSB-formatted Sokoban levels from a text file.
    pub fn from_file(path: &str) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// Get the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

fn build_level(text: &str, name: Option<String>, index: usize) -> Result<Level, LevelError> {
    let board = Board::from_text(text.trim_end())?;
    Ok(Level {
        name: name.unwrap_or_else(|| format!("level {}", index + 1)),
        board,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_basic() {
        let level1 = "####
# .#
#  ###
#*@  #
#  $ #
#  ###
####";

        let level2 = "######
#    #
# #@ #
# $* #
# .* #
#    #
######";

        let xsb_content = format!("; first\n\n{}\n\n; second\n\n{}\n", level1, level2);
        let levels = Levels::from_text(&xsb_content).unwrap();

        assert_eq!(levels.len(), 2);
        assert_eq!(levels.get(0).unwrap().name, "first");
        assert_eq!(levels.get(1).unwrap().name, "second");
        assert_eq!(
            levels.get(0).unwrap().board.to_string().trim_end(),
            level1
        );
        assert_eq!(
            levels.get(1).unwrap().board.to_string().trim_end(),
            level2
        );
    }

    #[test]
    fn test_unnamed_levels_get_numbered() {
        let xsb_content = "####\n#@*#\n####\n\n####\n#*@#\n####\n";
        let levels = Levels::from_text(xsb_content).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels.get(0).unwrap().name, "level 1");
        assert_eq!(levels.get(1).unwrap().name, "level 2");
    }

    #[test]
    fn test_from_text_invalid_level() {
        let xsb_content = "; 1\n\n####\n#@@#\n####\n";
        let result = Levels::from_text(xsb_content);
        assert!(matches!(result, Err(LevelError::InvalidLevel(_))));
    }

    #[test]
    fn test_from_file_no_file() {
        let result = Levels::from_file("nonexistent_file.xsb");
        assert!(matches!(result, Err(LevelError::Io(_))));
    }
}
