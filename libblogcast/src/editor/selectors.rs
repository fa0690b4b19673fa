//! Naver SmartEditor ONE selector chains
//!
//! The editor's class names change without notice. Each chain lists the
//! current selector first and older or looser ones after it.

/// Name of the iframe holding the editor on the blog write page
pub const EDITOR_FRAME: &str = "mainFrame";

/// Present once the editor has finished loading
pub const EDITOR_READY: &[&str] = &[
    ".se-content",
    ".se-documentTitle",
    "#SE-editor",
];

/// "Continue the draft you were writing?" dialog
pub const RESTORE_DRAFT_CANCEL: &[&str] = &[
    ".se-popup-button-cancel",
    ".se-popup-container button.se-popup-button-cancel",
    "button[class*='popup-button-cancel']",
];

pub const HELP_PANEL_CLOSE: &[&str] = &[
    ".se-help-panel-close-button",
    "button[class*='help-panel-close']",
];

pub const TITLE: &[&str] = &[
    ".se-documentTitle .se-text-paragraph",
    ".se-title-text .se-text-paragraph",
    ".se-documentTitle",
    "[placeholder='제목']",
];

pub const BODY: &[&str] = &[
    ".se-component.se-text .se-text-paragraph",
    ".se-section-text .se-text-paragraph",
    ".se-content .se-text-paragraph",
];

/// Toolbar dropdown listing paragraph styles
pub const TEXT_FORMAT_BUTTON: &[&str] = &[
    "button.se-text-format-toolbar-button",
    "button[data-name='text-format']",
];

pub const HEADING_FORMAT_OPTION: &[&str] = &[
    "button.se-toolbar-option-text-format-sectionTitle-button",
    "button[data-value='sectionTitle']",
    "button.se-toolbar-option-text-format-heading2-button",
];

pub const BODY_FORMAT_OPTION: &[&str] = &[
    "button.se-toolbar-option-text-format-text-button",
    "button[data-value='text']",
];

pub const IMAGE_BUTTON: &[&str] = &[
    "button.se-image-toolbar-button",
    "button[data-name='image']",
];

pub const IMAGE_FILE_INPUT: &[&str] = &[
    "input#hidden-file",
    "input[type='file'][accept*='image']",
    "input[type='file']",
];

/// Appears in the document once an uploaded image has been placed
pub const UPLOADED_IMAGE: &[&str] = &[
    ".se-component.se-image img",
    ".se-image-resource",
];

/// Opens the publish settings layer
pub const PUBLISH_BUTTON: &[&str] = &[
    "button.publish_btn__m9KHH",
    "button[class*='publish_btn']",
    "button[data-click-area='tpb.publish']",
];

pub const TAG_INPUT: &[&str] = &[
    "input#tag-input",
    "input[class*='tag_input']",
    "input[placeholder*='태그']",
];

pub const CONFIRM_PUBLISH: &[&str] = &[
    "button.confirm_btn__WEaBq",
    "button[class*='confirm_btn']",
    "button[data-testid='seOnePublishBtn']",
    "button[data-click-area='tpb*i.publish']",
];

/// URL fragments that mean the browser is still on the write page
pub const WRITE_PAGE_MARKERS: &[&str] = &["Redirect=Write", "PostWriteForm", "postwrite"];

/// Whether `url` still points at the editor rather than a published post
pub fn is_write_page(url: &str) -> bool {
    url.is_empty()
        || url == "about:blank"
        || WRITE_PAGE_MARKERS.iter().any(|marker| url.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_write_page() {
        assert!(is_write_page("https://blog.naver.com/me?Redirect=Write"));
        assert!(is_write_page(
            "https://blog.naver.com/PostWriteForm.naver?blogId=me"
        ));
        assert!(is_write_page(""));
        assert!(!is_write_page("https://blog.naver.com/me/223456789"));
    }
}
