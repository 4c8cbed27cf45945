// file: src/redaction/prompt.rs
// description: fixed redaction instruction interpolated with a batch of csv rows
// reference: fixed redaction instruction template

const INSTRUCTION: &str = "You are a data redactor. Remove or mask all PII (names, emails, SSNs, \
phone numbers, addresses, credit cards) from the following CSV data, but KEEP the CSV structure \
intact: the same number of rows, the same number of fields in every row, and the same row order.";

const STRICT_SUFFIX: &str = "Your previous answer could not be used. Output CSV only: no code \
fences, no header, no blank lines, no explanations. Quote any field containing a comma, a quote \
or a line break.";

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptTemplate;

impl PromptTemplate {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, batch_csv: &str, rows: usize, columns: usize, strict: bool) -> String {
        let mut prompt = format!(
            "{}\nThe input has exactly {} rows of {} fields; return exactly {} rows of {} fields.\n",
            INSTRUCTION, rows, columns, rows, columns
        );

        if strict {
            prompt.push_str(STRICT_SUFFIX);
            prompt.push('\n');
        }

        prompt.push_str("\nInput CSV:\n");
        prompt.push_str(batch_csv);
        if !batch_csv.ends_with('\n') {
            prompt.push('\n');
        }
        prompt.push_str("Return only the sanitized CSV data, without any commentary.\n");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embeds_batch_and_counts() {
        let prompt = PromptTemplate::new().render("a,x@y.com\nb,z@y.com\n", 2, 2, false);

        assert!(prompt.contains("exactly 2 rows of 2 fields"));
        assert!(prompt.contains("Input CSV:\na,x@y.com\nb,z@y.com\n"));
        assert!(prompt.ends_with("without any commentary.\n"));
        assert!(!prompt.contains("previous answer"));
    }

    #[test]
    fn test_strict_render() {
        let prompt = PromptTemplate::new().render("a,b", 1, 2, true);
        assert!(prompt.contains("no code fences"));
        assert!(prompt.contains("Input CSV:\na,b\n"));
    }
}
