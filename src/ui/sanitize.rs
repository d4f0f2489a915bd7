/// Escape `<` and `>` before the text is inserted as markup.
///
/// Only angle brackets are touched. Quotes and ampersands pass through
/// unchanged, so the result is not safe inside an attribute value.
pub fn escape_angle_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}
