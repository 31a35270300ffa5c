/// The extraction prompt for image-sourced recipes.
///
/// The prompt describes the exact JSON field set the rest of the
/// application consumes. It is loaded from `image_prompt.txt` at compile
/// time using the `include_str!` macro, making it easy to edit without
/// dealing with Rust string syntax.
pub const IMAGE_EXTRACTION_PROMPT: &str = include_str!("image_prompt.txt");

const URL_EXTRACTION_TEMPLATE: &str = include_str!("url_prompt.txt");

/// Build the extraction prompt for a URL-sourced recipe.
pub fn url_extraction_prompt(url: &str) -> String {
    URL_EXTRACTION_TEMPLATE.replace("{url}", url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_embedded() {
        assert!(!IMAGE_EXTRACTION_PROMPT.is_empty());
        assert!(IMAGE_EXTRACTION_PROMPT.contains("JSON"));
        assert!(IMAGE_EXTRACTION_PROMPT.contains("ingredients"));
        assert!(IMAGE_EXTRACTION_PROMPT.contains("instructions"));
    }

    #[test]
    fn test_url_prompt_interpolates_url() {
        let prompt = url_extraction_prompt("https://example.com/cake");
        assert!(prompt.contains("https://example.com/cake"));
        assert!(!prompt.contains("{url}"));
        assert!(prompt.contains("image_url"));
    }

    #[test]
    fn test_image_prompt_has_no_image_url_field() {
        // The photographed page IS the recipe image; the model must not
        // be asked to invent a web URL for it.
        assert!(!IMAGE_EXTRACTION_PROMPT.contains("image_url"));
    }
}
