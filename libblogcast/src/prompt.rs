//! Generation prompt assembly
//!
//! Two operator-written templates are filled with the keyword and wrapped in
//! fixed banners, followed by an instruction block asking the model for the
//! labeled layout the parser reads first.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, TemplateError};
use crate::types::Keyword;

pub const KEYWORD_PLACEHOLDER: &str = "{keyword}";

const FIRST_BANNER: &str = "===== [1] 작성 지침 =====";
const SECOND_BANNER: &str = "===== [2] 추가 지침 =====";
const OUTPUT_RULES: &str = "===== 출력 형식 =====
아래 형식을 반드시 지켜서 작성하세요. 각 라벨은 한 줄에 단독으로 쓰고, 라벨 다음 줄부터 내용을 씁니다.
마크다운 기호(#, *, -)나 이모지는 사용하지 마세요.

제목
(블로그 글 제목 한 줄)
서론
(독자의 관심을 끄는 도입 문단)
소제목
(첫 번째 소제목)
본문
(첫 번째 소제목에 대한 본문)
소제목
(두 번째 소제목)
본문
(두 번째 소제목에 대한 본문)
소제목
(세 번째 소제목)
본문
(세 번째 소제목에 대한 본문)";

/// The two prompt templates, loaded once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub first: String,
    pub second: String,
}

impl PromptTemplates {
    /// Read both template files.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Missing` for a file that does not exist; the
    /// caller should stop the run.
    pub fn load(first: &Path, second: &Path) -> Result<Self> {
        Ok(Self {
            first: read_template(first)?,
            second: read_template(second)?,
        })
    }

    pub fn compose(&self, keyword: &Keyword) -> String {
        compose(&self.first, &self.second, keyword.as_str())
    }
}

/// Substitute `keyword` into both templates and join them with the fixed
/// banners and output rules.
pub fn compose(first: &str, second: &str, keyword: &str) -> String {
    let first = first.replace(KEYWORD_PLACEHOLDER, keyword);
    let second = second.replace(KEYWORD_PLACEHOLDER, keyword);
    format!(
        "{FIRST_BANNER}\n{}\n\n{SECOND_BANNER}\n{}\n\n{OUTPUT_RULES}\n\n키워드: {keyword}\n",
        first.trim(),
        second.trim(),
    )
}

fn read_template(path: &Path) -> std::result::Result<String, TemplateError> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            TemplateError::Missing(PathBuf::from(path))
        } else {
            TemplateError::Read {
                path: PathBuf::from(path),
                source: e,
            }
        }
    })
}
