use unicode_segmentation::UnicodeSegmentation;

/// First `limit` characters of `text`, never splitting a grapheme cluster.
pub fn truncate_context(text: &str, limit: usize) -> &str {
    let mut taken = 0;
    let mut end = 0;

    for (offset, grapheme) in text.grapheme_indices(true) {
        let width = grapheme.chars().count();
        if taken + width > limit {
            break;
        }
        taken += width;
        end = offset + grapheme.len();
    }

    &text[..end]
}

pub fn build_prompt(pdf_text: &str, question: &str, limit: usize) -> String {
    let context = truncate_context(pdf_text, limit);

    format!(
        r#"Based on the following PDF content:

{context}

User question: {question}

Please provide a relevant and accurate response based on the PDF content."#
    )
}
