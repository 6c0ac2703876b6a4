use crate::cover_form::{BookCoverForm, CoverFormat};

/// Prompt shared by every variant of one request.
pub fn base_prompt(form: &BookCoverForm) -> String {
    let mut prompt = String::from("Create a professional book cover design. ");

    match form.format {
        CoverFormat::FrontCover => prompt.push_str(&format!(
            "This is a Front Cover (Vertical). Title: \"{}\", Author: \"{}\". \
             Place the title prominently in high-quality typography. \
             Ensure the background suits the book's theme. \
             IMPORTANT: Keep the top-right corner completely clean for a publisher logo. ",
            form.title, form.author
        )),
        CoverFormat::Spine => prompt.push_str(&format!(
            "This is a Vertical Book Spine. Title: \"{}\", Author: \"{}\". \
             Text should be rotated 90 degrees or stacked vertically. ",
            form.title, form.author
        )),
        CoverFormat::BackCover => prompt.push_str(&format!(
            "This is a Back Cover. It must feature this blurb text: \"{}\". \
             Include space for a barcode at the bottom center or right. \
             IMPORTANT: Keep the bottom-left corner completely clean for a publisher logo. ",
            form.blurb
        )),
        CoverFormat::ContentLayout => prompt.push_str(
            "This is a Horizontal Interior Layout Banner. \
             Plain white background with very subtle artistic flourishes. No text. ",
        ),
    }

    prompt.push_str(&format!(
        "Style: {}. Genre: {}. Trend: {}. Texture: {}. Idea: {}. \
         Use high professional publishing quality. ",
        form.style.as_str(),
        form.genre.as_str(),
        form.trend.as_str(),
        form.texture.as_str(),
        form.design_idea
    ));

    prompt
}

/// Prompt for one variant; `index` is zero-based.
pub fn variant_prompt(base: &str, index: usize) -> String {
    format!("{} Variation {}.", base, index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover_form::{CoverGenre, CoverStyle};

    fn form(format: CoverFormat) -> BookCoverForm {
        BookCoverForm {
            title: "Bumi Manusia".to_string(),
            author: "Pramoedya".to_string(),
            blurb: "A story of Minke.".to_string(),
            design_idea: "colonial Java at dusk".to_string(),
            format,
            ..Default::default()
        }
    }

    #[test]
    fn test_front_cover_prompt() {
        let prompt = base_prompt(&form(CoverFormat::FrontCover));
        assert!(prompt.starts_with("Create a professional book cover design. This is a Front Cover"));
        assert!(prompt.contains("Title: \"Bumi Manusia\", Author: \"Pramoedya\""));
        assert!(prompt.contains("top-right corner completely clean"));
        assert!(!prompt.contains("A story of Minke."));
    }

    #[test]
    fn test_back_cover_prompt_uses_blurb() {
        let prompt = base_prompt(&form(CoverFormat::BackCover));
        assert!(prompt.contains("blurb text: \"A story of Minke.\""));
        assert!(prompt.contains("bottom-left corner"));
        assert!(!prompt.contains("Bumi Manusia"));
    }

    #[test]
    fn test_spine_and_layout_prompts() {
        assert!(base_prompt(&form(CoverFormat::Spine)).contains("rotated 90 degrees"));
        let layout = base_prompt(&form(CoverFormat::ContentLayout));
        assert!(layout.contains("No text."));
        assert!(!layout.contains("Bumi Manusia"));
    }

    #[test]
    fn test_attributes_are_appended() {
        let mut f = form(CoverFormat::FrontCover);
        f.style = CoverStyle::PopArt;
        f.genre = CoverGenre::TrueCrime;
        let prompt = base_prompt(&f);
        assert!(prompt.contains(
            "Style: Pop Art. Genre: True Crime. Trend: Swiss style. Texture: organic. Idea: colonial Java at dusk."
        ));
        assert!(prompt.ends_with("Use high professional publishing quality. "));
    }

    #[test]
    fn test_variant_prompt_is_one_based() {
        assert_eq!(variant_prompt("Base.", 0), "Base. Variation 1.");
        assert_eq!(variant_prompt("Base.", 7), "Base. Variation 8.");
    }
}
