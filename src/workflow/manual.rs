//! Author-only guidance blocks that live in drafts and are dropped when a
//! report is finalized.

pub const MANUAL_START: &str = "==[MANUAL]==";
pub const MANUAL_END: &str = "==[END OF MANUAL]==";

/// Removes every manual block, marker lines included. An unterminated
/// block runs to the end of the text; a stray end marker line is dropped on
/// its own.
pub fn strip_manual_blocks(text: &str) -> String {
    let mut kept = Vec::new();
    let mut in_manual = false;
    for line in text.split('\n') {
        if line.contains(MANUAL_START) {
            in_manual = true;
        } else if line.contains(MANUAL_END) {
            in_manual = false;
        } else if !in_manual {
            kept.push(line);
        }
    }
    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_blocks_and_keeps_order() {
        let text = "# Weekly\n\n\
                    ==[MANUAL]==\n\
                    Fill in the highlights.\n\
                    ==[END OF MANUAL]==\n\
                    Alerts went down.\n\
                    ==[MANUAL]==\n\
                    remember the appendix\n\
                    ==[END OF MANUAL]==\n\
                    End.";
        assert_eq!(
            strip_manual_blocks(text),
            "# Weekly\n\nAlerts went down.\nEnd."
        );
    }

    #[test]
    fn test_text_without_markers_unchanged() {
        let text = "# Report\n\nEmpty\n\n";
        assert_eq!(strip_manual_blocks(text), text);
    }

    #[test]
    fn test_unterminated_block() {
        assert_eq!(strip_manual_blocks("keep\n==[MANUAL]==\ndrop\ndrop"), "keep");
    }

    #[test]
    fn test_stray_end_marker() {
        assert_eq!(strip_manual_blocks("a\n==[END OF MANUAL]==\nb"), "a\nb");
    }

    #[test]
    fn test_markers_inside_lines() {
        let text = "a\nnote: ==[MANUAL]== start\nhidden\n-- ==[END OF MANUAL]== --\nb";
        assert_eq!(strip_manual_blocks(text), "a\nb");
    }

    #[test]
    fn test_builder_output_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = crate::report::Report::new(dir.path()).unwrap();
        report.add_text("Title", "title1").unwrap();
        report.add_manual("Ask finance for Q3 numbers");
        report.add_text("Body", "normal").unwrap();

        assert_eq!(strip_manual_blocks(report.markdown()), "# Title\n\n\nBody\n\n");
    }
}
