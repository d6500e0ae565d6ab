use serde::Serialize;

/// One label/score pair produced by the engine.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Category {
    pub label: String,
    pub display_name: String,
    pub score: f32,
    pub index: usize,
}

impl Category {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        let label = label.into();
        Category {
            display_name: label.clone(),
            label,
            score,
            index: 0,
        }
    }
}

/// Categories for one output head, ordered by descending score.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct Classifications {
    pub head_index: usize,
    pub categories: Vec<Category>,
}

impl Classifications {
    pub fn new(head_index: usize, categories: Vec<Category>) -> Self {
        Self {
            head_index,
            categories,
        }
    }

    pub fn top(&self) -> Option<&Category> {
        self.categories.first()
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    ModelLoad,
    ImageDecode,
    Inference,
}

/// User-facing status of the classification screen.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScreenStatus {
    Uninitialized,
    Classified { label: String, score: f32 },
    NoResult,
    Failed { stage: FailureStage, reason: String },
}

impl ScreenStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, ScreenStatus::Failed { .. })
    }
}

/// Single-line text widget. Starts out empty.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct TextView {
    text: String,
}

impl TextView {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ScreenState {
    #[serde(rename = "message")]
    pub tv_message: TextView,
    pub status: ScreenStatus,
}

impl ScreenState {
    pub fn message(&self) -> &str {
        self.tv_message.text()
    }
}

impl Default for ScreenState {
    fn default() -> Self {
        Self {
            tv_message: TextView::default(),
            status: ScreenStatus::Uninitialized,
        }
    }
}
