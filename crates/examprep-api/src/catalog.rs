//! Request bodies for catalog and content administration.
//!
//! Every input is partial: `create` demands the fields a new record needs,
//! `apply` merges whatever was sent over an existing record. Both run the
//! model's own validation before handing the record back.

use chrono::{DateTime, Utc};
use examprep_core::DocumentId;
use examprep_model::{
    Announcement, AnnouncementKind, Audience, Chapter, Course, Difficulty, OptionKey, Priority,
    Question, QuestionOptions, StudyMaterial, Subject, Test, Topic, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ApiError;

fn rejected(err: ValidationError) -> ApiError {
    ApiError::validation_failed(err.0.clone(), json!([{"reason": err.0}]))
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing_field(field))
}

fn parent_id(field: &str, value: &Option<String>) -> Result<DocumentId, ApiError> {
    let raw = required(field, value)?;
    DocumentId::parse(raw).map_err(|_| {
        ApiError::validation_failed(
            format!("{field} is not a valid id"),
            json!([{"field": field, "reason": "invalid_id", "value": raw}]),
        )
    })
}

fn merge<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

fn merge_text(slot: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        *slot = v.trim().to_string();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl CourseInput {
    pub fn create(&self, now: DateTime<Utc>) -> Result<Course, ApiError> {
        let name = required("name", &self.name)?;
        let price = self.price.ok_or_else(|| ApiError::missing_field("price"))?;
        let course = Course {
            id: DocumentId::generate(),
            name: name.to_string(),
            description: self.description.clone().unwrap_or_default(),
            price,
            published: self.published.unwrap_or(false),
            thumbnail: self.thumbnail.clone(),
            created_at: now,
        };
        course.validate().map_err(rejected)?;
        Ok(course)
    }

    pub fn apply(&self, course: &mut Course) -> Result<(), ApiError> {
        merge_text(&mut course.name, &self.name);
        merge(&mut course.description, &self.description);
        merge(&mut course.price, &self.price);
        merge(&mut course.published, &self.published);
        if self.thumbnail.is_some() {
            course.thumbnail = self.thumbnail.clone();
        }
        course.validate().map_err(rejected)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub published: Option<bool>,
}

impl PublishRequest {
    pub fn validate(&self) -> Result<bool, ApiError> {
        self.published
            .ok_or_else(|| ApiError::missing_field("published"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInput {
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl SubjectInput {
    pub fn course_id(&self) -> Result<DocumentId, ApiError> {
        parent_id("courseId", &self.course_id)
    }

    pub fn create(&self, course_id: DocumentId) -> Result<Subject, ApiError> {
        Ok(Subject {
            id: DocumentId::generate(),
            course_id,
            name: required("name", &self.name)?.to_string(),
            description: self.description.clone(),
            order: self.order.unwrap_or(0),
        })
    }

    pub fn apply(&self, subject: &mut Subject) -> Result<(), ApiError> {
        merge_text(&mut subject.name, &self.name);
        if self.description.is_some() {
            subject.description = self.description.clone();
        }
        merge(&mut subject.order, &self.order);
        non_empty("name", &subject.name)
    }
}

fn non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::missing_field(field));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterInput {
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl ChapterInput {
    pub fn subject_id(&self) -> Result<DocumentId, ApiError> {
        parent_id("subjectId", &self.subject_id)
    }

    /// The course id is inherited from the parent subject.
    pub fn create(&self, subject: &Subject) -> Result<Chapter, ApiError> {
        Ok(Chapter {
            id: DocumentId::generate(),
            course_id: subject.course_id.clone(),
            subject_id: subject.id.clone(),
            name: required("name", &self.name)?.to_string(),
            description: self.description.clone(),
            order: self.order.unwrap_or(0),
        })
    }

    pub fn apply(&self, chapter: &mut Chapter) -> Result<(), ApiError> {
        merge_text(&mut chapter.name, &self.name);
        if self.description.is_some() {
            chapter.description = self.description.clone();
        }
        merge(&mut chapter.order, &self.order);
        non_empty("name", &chapter.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicInput {
    #[serde(default)]
    pub chapter_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl TopicInput {
    pub fn chapter_id(&self) -> Result<DocumentId, ApiError> {
        parent_id("chapterId", &self.chapter_id)
    }

    pub fn create(&self, chapter: &Chapter) -> Result<Topic, ApiError> {
        Ok(Topic {
            id: DocumentId::generate(),
            course_id: chapter.course_id.clone(),
            subject_id: Some(chapter.subject_id.clone()),
            chapter_id: chapter.id.clone(),
            name: required("name", &self.name)?.to_string(),
            description: self.description.clone(),
            order: self.order.unwrap_or(0),
        })
    }

    pub fn apply(&self, topic: &mut Topic) -> Result<(), ApiError> {
        merge_text(&mut topic.name, &self.name);
        if self.description.is_some() {
            topic.description = self.description.clone();
        }
        merge(&mut topic.order, &self.order);
        non_empty("name", &topic.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInput {
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub total_marks: Option<f64>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl TestInput {
    pub fn topic_id(&self) -> Result<DocumentId, ApiError> {
        parent_id("topicId", &self.topic_id)
    }

    pub fn create(&self, topic: &Topic) -> Result<Test, ApiError> {
        Ok(Test {
            id: DocumentId::generate(),
            course_id: topic.course_id.clone(),
            topic_id: topic.id.clone(),
            title: required("title", &self.title)?.to_string(),
            duration_minutes: self.duration_minutes,
            total_marks: self.total_marks,
            order: self.order.unwrap_or(0),
        })
    }

    pub fn apply(&self, test: &mut Test) -> Result<(), ApiError> {
        merge_text(&mut test.title, &self.title);
        if self.duration_minutes.is_some() {
            test.duration_minutes = self.duration_minutes;
        }
        if self.total_marks.is_some() {
            test.total_marks = self.total_marks;
        }
        merge(&mut test.order, &self.order);
        non_empty("title", &test.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[serde(default)]
    pub test_id: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub options: Option<QuestionOptions>,
    #[serde(default)]
    pub correct_option: Option<OptionKey>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub marks: Option<f64>,
    #[serde(default)]
    pub negative_marks: Option<f64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl QuestionInput {
    pub fn test_id(&self) -> Result<DocumentId, ApiError> {
        parent_id("testId", &self.test_id)
    }

    pub fn create(&self, test_id: DocumentId) -> Result<Question, ApiError> {
        let question = Question {
            id: DocumentId::generate(),
            test_id,
            question_text: required("questionText", &self.question_text)?.to_string(),
            options: self
                .options
                .clone()
                .ok_or_else(|| ApiError::missing_field("options"))?,
            correct_option: self
                .correct_option
                .ok_or_else(|| ApiError::missing_field("correctOption"))?,
            explanation: self.explanation.clone().unwrap_or_default(),
            difficulty: self.difficulty.unwrap_or_default(),
            marks: self.marks.unwrap_or(2.0),
            negative_marks: self.negative_marks.unwrap_or(0.66),
            is_active: self.is_active.unwrap_or(true),
        };
        question.validate().map_err(rejected)?;
        Ok(question)
    }

    pub fn apply(&self, question: &mut Question) -> Result<(), ApiError> {
        merge_text(&mut question.question_text, &self.question_text);
        merge(&mut question.options, &self.options);
        merge(&mut question.correct_option, &self.correct_option);
        merge(&mut question.explanation, &self.explanation);
        merge(&mut question.difficulty, &self.difficulty);
        merge(&mut question.marks, &self.marks);
        merge(&mut question.negative_marks, &self.negative_marks);
        merge(&mut question.is_active, &self.is_active);
        question.validate().map_err(rejected)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterialInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, alias = "type")]
    pub material_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub course_id: Option<String>,
}

impl StudyMaterialInput {
    /// Optional course scope; absent means visible to every student.
    pub fn course_id(&self) -> Result<Option<DocumentId>, ApiError> {
        if required("courseId", &self.course_id).is_err() {
            return Ok(None);
        }
        parent_id("courseId", &self.course_id).map(Some)
    }

    pub fn create(
        &self,
        course_id: Option<DocumentId>,
        uploaded_by: Option<DocumentId>,
        now: DateTime<Utc>,
    ) -> Result<StudyMaterial, ApiError> {
        let material = StudyMaterial {
            id: DocumentId::generate(),
            title: required("title", &self.title)?.to_string(),
            description: self.description.clone().unwrap_or_default(),
            subject: required("subject", &self.subject)?.to_string(),
            material_type: self
                .material_type
                .clone()
                .unwrap_or_else(|| "pdf".to_string()),
            file_name: required("fileName", &self.file_name)?.to_string(),
            file_size: self.file_size.clone().unwrap_or_default(),
            tags: self.tags.clone(),
            download_count: 0,
            course_id,
            uploaded_by,
            is_active: true,
            created_at: now,
        };
        material.validate().map_err(rejected)?;
        Ok(material)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<AnnouncementKind>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub target_audience: Option<Audience>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl AnnouncementInput {
    pub fn create(
        &self,
        created_by: Option<DocumentId>,
        now: DateTime<Utc>,
    ) -> Result<Announcement, ApiError> {
        if let Some(expiry) = self.expiry_date {
            if expiry <= now {
                return Err(ApiError::validation_failed(
                    "expiryDate must be in the future",
                    json!([{"field": "expiryDate", "reason": "past"}]),
                ));
            }
        }
        let announcement = Announcement {
            id: DocumentId::generate(),
            title: required("title", &self.title)?.to_string(),
            content: required("content", &self.content)?.to_string(),
            kind: self.kind.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            target_audience: self.target_audience.unwrap_or_default(),
            is_pinned: self.is_pinned.unwrap_or(false),
            expiry_date: self.expiry_date,
            is_active: true,
            created_by,
            created_at: now,
        };
        announcement.validate().map_err(rejected)?;
        Ok(announcement)
    }
}
