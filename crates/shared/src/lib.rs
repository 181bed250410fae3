use serde::{Deserialize, Serialize};

pub mod prompt;

pub use prompt::{EXAMPLE_SNIPPET, PROMPT_TEMPLATE};

/// Уникальный идентификатор модели, выданный движком
pub type ModelId = u64;

/// Этап конвейера, на котором произошла ошибка
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Разбор, проверка типов, разрешение имён или загрузка артефакта
    Compile,
    /// Выполнение точки входа `createModel`
    Execute,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Compile => write!(f, "compile"),
            Stage::Execute => write!(f, "execute"),
        }
    }
}

/// Позиция в тексте сниппета (строки и столбцы с 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Дополнительное сообщение к диагностике (следующие ошибки компиляции)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Структурированная ошибка, возвращаемая вызывающему коду
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Остальные ошибки того же этапа, если их несколько
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

impl Diagnostic {
    pub fn compile(message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            stage: Stage::Compile,
            message: message.into(),
            location,
            notes: Vec::new(),
        }
    }

    pub fn execute(message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            stage: Stage::Execute,
            message: message.into(),
            location,
            notes: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: Vec<Note>) -> Self {
        self.notes = notes;
        self
    }

    /// Количество ошибок, включая основную
    pub fn error_count(&self) -> usize {
        1 + self.notes.len()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} error at {}: {}", self.stage, loc, self.message),
            None => write!(f, "{} error: {}", self.stage, self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Краткое описание построенной модели для слоя представления
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: ModelId,
    pub node_count: usize,
    pub part_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Габариты в мировых координатах: [min, max]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[[f32; 3]; 2]>,
}

/// Запрос на компиляцию сниппета
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileRequest {
    pub snippet: String,
}

/// Ответ на запрос компиляции
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompileResponse {
    Ok { model: ModelSummary },
    Error { diagnostic: Diagnostic },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serde() {
        assert_eq!(serde_json::to_string(&Stage::Compile).unwrap(), r#""compile""#);
        assert_eq!(serde_json::to_string(&Stage::Execute).unwrap(), r#""execute""#);
    }

    #[test]
    fn test_diagnostic_skips_empty_fields() {
        let d = Diagnostic::execute("boom", None);
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("location"));
        assert!(!json.contains("notes"));
    }

    #[test]
    fn test_diagnostic_display_with_location() {
        let d = Diagnostic::compile("cannot resolve symbol 'Foo'", Some(Location::new(3, 7)));
        assert_eq!(d.to_string(), "compile error at 3:7: cannot resolve symbol 'Foo'");
    }

    #[test]
    fn test_diagnostic_error_count() {
        let d = Diagnostic::compile("first", None).with_notes(vec![Note {
            message: "second".into(),
            location: Some(Location::new(2, 1)),
        }]);
        assert_eq!(d.error_count(), 2);
    }

    #[test]
    fn test_compile_response_tagged() {
        let r = CompileResponse::Error {
            diagnostic: Diagnostic::compile("x", None),
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains(r#""status":"error""#));
        let back: CompileResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
