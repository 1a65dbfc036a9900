//! System clipboard access for copying and pasting single cells.

pub struct SystemClipboard;

impl SystemClipboard {
    pub fn copy(text: &str) -> Result<(), String> {
        let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
        clipboard.set_text(text.to_string()).map_err(|e| e.to_string())
    }

    /// Clipboard text with line breaks folded into spaces, since a cell
    /// holds a single line.
    pub fn paste() -> Result<String, String> {
        let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
        let text = clipboard.get_text().map_err(|e| e.to_string())?;
        Ok(single_line(&text))
    }
}

pub(crate) fn single_line(text: &str) -> String {
    text.trim_end_matches(['\r', '\n'])
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("Bolivia\n"), "Bolivia");
        assert_eq!(single_line("a\r\nb"), "a b");
        assert_eq!(single_line(""), "");
    }
}
