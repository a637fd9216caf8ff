/// Placeholder replaced by the document text.
const TEXT_MARKER: &str = "<<BIBLIOGRAPHYTEXT>>";

const TEMPLATE: &str = r#"You are an expert in extracting literature sources from texts.
From the following text, extract all references (books, articles, websites, papers, etc.) as a JSON list with the following fields:

- title (title of the source)
- authors (list of authors, if available)
- year (year of publication, if available)
- url (link to the source, if available)
- doi (DOI of the source, only if it is printed in the text)
- publisher (publisher or institution, if available)

If some information is missing, leave the field out. Don't add any other fields.

Output the result as a pure JSON array, without any other text or explanations.
Only return valid JSON, with no Markdown formatting and no introduction. The JSON must start directly.
Example output:
[
  {
    "title": "Deep Learning",
    "authors": ["Ian Goodfellow", "Yoshua Bengio", "Aaron Courville"],
    "year": 2016,
    "url": "https://www.deeplearningbook.org",
    "publisher": "MIT Press"
  },
  {
    "title": "Einführung in die Versicherungswirtschaft",
    "authors": ["Max Mustermann"],
    "year": 2020
  }
]

This is the text from which you should extract the references:
'''
<<BIBLIOGRAPHYTEXT>>
'''
"#;

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// The extraction prompt with the (truncated) document text substituted in.
pub fn build_prompt(text: &str, max_chars: usize) -> String {
    let body = truncate_chars(text, max_chars);
    if body.len() < text.len() {
        tracing::debug!(
            kept = max_chars,
            total = text.chars().count(),
            "document text truncated for the LLM"
        );
    }
    TEMPLATE.replacen(TEXT_MARKER, body, 1)
}
