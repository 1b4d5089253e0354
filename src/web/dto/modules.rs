use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{DatabaseResult, entity::ModuleWithLessonsRow};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonShort {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub order_index: i32,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModuleWithLessons {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub completed_lessons: usize,
    pub lessons: Vec<LessonShort>,
}

impl TryFrom<ModuleWithLessonsRow> for ModuleWithLessons {
    type Error = serde_json::Error;

    fn try_from(value: ModuleWithLessonsRow) -> Result<Self, Self::Error> {
        let lessons: Vec<LessonShort> = serde_json::from_value(value.lessons)?;
        Ok(Self {
            id: value.id,
            title: value.title,
            description: value.description,
            order_index: value.order_index,
            completed_lessons: lessons.iter().filter(|l| l.completed).count(),
            lessons,
        })
    }
}

impl ModuleWithLessons {
    pub fn from_rows(rows: Vec<ModuleWithLessonsRow>) -> DatabaseResult<Vec<Self>> {
        Ok(rows
            .into_iter()
            .map(ModuleWithLessons::try_from)
            .collect::<Result<_, _>>()?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn module_rows_decode_lessons() {
        let row = ModuleWithLessonsRow {
            id: Uuid::new_v4(),
            title: "Basics".into(),
            description: String::new(),
            order_index: 1,
            lessons: json!([
                { "id": Uuid::new_v4(), "title": "Intro", "completed": true, "order_index": 1 },
                { "id": Uuid::new_v4(), "title": "Next", "completed": false, "order_index": 2 },
            ]),
        };

        let modules = ModuleWithLessons::from_rows(vec![row]).unwrap();
        assert_eq!(modules[0].lessons.len(), 2);
        assert_eq!(modules[0].completed_lessons, 1);
    }

    #[test]
    fn malformed_lessons_fail() {
        let row = ModuleWithLessonsRow {
            id: Uuid::new_v4(),
            title: "Broken".into(),
            description: String::new(),
            order_index: 1,
            lessons: json!({ "not": "a list" }),
        };
        assert!(ModuleWithLessons::from_rows(vec![row]).is_err());
    }
}
