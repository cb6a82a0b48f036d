//! Content catalog
//!
//! The catalog lists every Course with its ordered Chapters, ordered Tasks and
//! its one Exam. It is loaded once and never mutated. Entities hold no
//! back-pointers; [`Catalog`] builds a read-only reverse index
//! (chapter/task/exam id -> course id) at construction.
//!
//! Catalog file format (TOML):
//!
//! ```toml
//! [[course]]
//! id = 1
//! title = "Foundations"
//! chapters = [10, 11]
//! tasks = [1000]
//!
//! [course.exam]
//! id = 100
//! display_name = "Foundations exam"
//! question_amount = 5
//! time_limit_minutes = 10
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Exam content attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamEntry {
    pub id: i64,
    /// Name shown in cooldown notifications
    pub display_name: String,
    #[serde(default = "default_question_amount")]
    pub question_amount: u32,
    #[serde(default = "default_time_limit_minutes")]
    pub time_limit_minutes: u32,
}

fn default_question_amount() -> u32 {
    10
}

fn default_time_limit_minutes() -> u32 {
    15
}

/// One course and the ids of everything it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEntry {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    /// Chapter ids in reading order
    #[serde(default, rename = "chapters")]
    pub chapter_ids: Vec<i64>,
    /// Task ids in display order
    #[serde(default, rename = "tasks")]
    pub task_ids: Vec<i64>,
    pub exam: ExamEntry,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "course")]
    courses: Vec<CourseEntry>,
}

/// Where navigation goes after a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextChapter {
    /// Following chapter of the same course
    InCourse { chapter_id: i64 },
    /// First chapter of a later course (which may still be locked)
    FirstOfNextCourse { course_id: i64, chapter_id: i64 },
    /// Last chapter of the last course that has chapters
    EndOfCurriculum,
}

/// Immutable, validated content catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Sorted ascending by id
    courses: Vec<CourseEntry>,
    course_index: HashMap<i64, usize>,
    chapter_to_course: HashMap<i64, usize>,
    task_to_course: HashMap<i64, usize>,
    exam_to_course: HashMap<i64, usize>,
}

impl Catalog {
    /// Build a catalog, validating id uniqueness and ownership
    ///
    /// Courses are sorted by id: course order drives both default unlocking
    /// and "next course" navigation.
    pub fn new(mut courses: Vec<CourseEntry>) -> Result<Self> {
        courses.sort_by_key(|c| c.id);

        let mut course_index = HashMap::new();
        let mut chapter_to_course = HashMap::new();
        let mut task_to_course = HashMap::new();
        let mut exam_to_course = HashMap::new();

        for (idx, course) in courses.iter().enumerate() {
            if course_index.insert(course.id, idx).is_some() {
                return Err(Error::Catalog(format!("duplicate course id {}", course.id)));
            }
            for &chapter_id in &course.chapter_ids {
                if chapter_to_course.insert(chapter_id, idx).is_some() {
                    return Err(Error::Catalog(format!(
                        "chapter {} listed more than once",
                        chapter_id
                    )));
                }
            }
            for &task_id in &course.task_ids {
                if task_to_course.insert(task_id, idx).is_some() {
                    return Err(Error::Catalog(format!("task {} listed more than once", task_id)));
                }
            }
            if exam_to_course.insert(course.exam.id, idx).is_some() {
                return Err(Error::Catalog(format!(
                    "exam {} shared by more than one course",
                    course.exam.id
                )));
            }
        }

        Ok(Self {
            courses,
            course_index,
            chapter_to_course,
            task_to_course,
            exam_to_course,
        })
    }

    /// Parse a catalog from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| Error::Catalog(format!("invalid catalog TOML: {}", e)))?;
        Self::new(file.courses)
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Catalog(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// All courses, ascending by id
    pub fn courses(&self) -> &[CourseEntry] {
        &self.courses
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn course(&self, course_id: i64) -> Result<&CourseEntry> {
        self.course_index
            .get(&course_id)
            .map(|&idx| &self.courses[idx])
            .ok_or_else(|| Error::Integrity(format!("course {} is not in the catalog", course_id)))
    }

    /// Owning course of a chapter
    pub fn course_for_chapter(&self, chapter_id: i64) -> Result<&CourseEntry> {
        self.chapter_to_course
            .get(&chapter_id)
            .map(|&idx| &self.courses[idx])
            .ok_or_else(|| {
                Error::Integrity(format!("chapter {} belongs to no known course", chapter_id))
            })
    }

    /// Owning course of a task
    pub fn course_for_task(&self, task_id: i64) -> Result<&CourseEntry> {
        self.task_to_course
            .get(&task_id)
            .map(|&idx| &self.courses[idx])
            .ok_or_else(|| Error::Integrity(format!("task {} belongs to no known course", task_id)))
    }

    /// Owning course of an exam
    pub fn course_for_exam(&self, exam_id: i64) -> Result<&CourseEntry> {
        self.exam_to_course
            .get(&exam_id)
            .map(|&idx| &self.courses[idx])
            .ok_or_else(|| Error::Integrity(format!("exam {} belongs to no known course", exam_id)))
    }

    pub fn exam(&self, exam_id: i64) -> Result<&ExamEntry> {
        self.course_for_exam(exam_id).map(|course| &course.exam)
    }

    /// Course following `course_id` in id order
    pub fn next_course(&self, course_id: i64) -> Result<Option<&CourseEntry>> {
        let idx = *self
            .course_index
            .get(&course_id)
            .ok_or_else(|| Error::Integrity(format!("course {} is not in the catalog", course_id)))?;
        Ok(self.courses.get(idx + 1))
    }

    /// Navigation target after finishing `chapter_id`
    ///
    /// Courses without chapters are skipped. Reaching the end of the
    /// curriculum is reported as its own value rather than repeating the
    /// current chapter.
    pub fn next_chapter(&self, chapter_id: i64) -> Result<NextChapter> {
        let course_idx = *self.chapter_to_course.get(&chapter_id).ok_or_else(|| {
            Error::Integrity(format!("chapter {} belongs to no known course", chapter_id))
        })?;
        let course = &self.courses[course_idx];

        let position = course
            .chapter_ids
            .iter()
            .position(|&id| id == chapter_id)
            .ok_or_else(|| {
                Error::Internal(format!("chapter {} missing from its course", chapter_id))
            })?;

        if let Some(&next) = course.chapter_ids.get(position + 1) {
            return Ok(NextChapter::InCourse { chapter_id: next });
        }

        let following = self.courses[course_idx + 1..]
            .iter()
            .find_map(|c| c.chapter_ids.first().map(|&first| (c.id, first)));

        Ok(match following {
            Some((course_id, chapter_id)) => NextChapter::FirstOfNextCourse {
                course_id,
                chapter_id,
            },
            None => NextChapter::EndOfCurriculum,
        })
    }

    /// Course ids, ascending
    pub fn course_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.courses.iter().map(|c| c.id)
    }

    pub fn chapter_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.courses.iter().flat_map(|c| c.chapter_ids.iter().copied())
    }

    pub fn task_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.courses.iter().flat_map(|c| c.task_ids.iter().copied())
    }

    pub fn exam_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.courses.iter().map(|c| c.exam.id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn course(id: i64, chapters: &[i64], tasks: &[i64], exam_id: i64) -> CourseEntry {
        CourseEntry {
            id,
            title: format!("Course {}", id),
            chapter_ids: chapters.to_vec(),
            task_ids: tasks.to_vec(),
            exam: ExamEntry {
                id: exam_id,
                display_name: format!("Exam {}", exam_id),
                question_amount: 5,
                time_limit_minutes: 10,
            },
        }
    }

    #[test]
    fn test_courses_sorted_by_id() {
        let catalog = Catalog::new(vec![course(2, &[20], &[], 200), course(1, &[10], &[], 100)])
            .unwrap();
        let ids: Vec<i64> = catalog.course_ids().collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_reverse_index() {
        let catalog = Catalog::new(vec![
            course(1, &[10, 11], &[1000], 100),
            course(2, &[20], &[2000], 200),
        ])
        .unwrap();

        assert_eq!(catalog.course_for_chapter(11).unwrap().id, 1);
        assert_eq!(catalog.course_for_task(2000).unwrap().id, 2);
        assert_eq!(catalog.course_for_exam(200).unwrap().id, 2);
        assert_eq!(catalog.exam(100).unwrap().display_name, "Exam 100");
    }

    #[test]
    fn test_unknown_chapter_is_integrity_error() {
        let catalog = Catalog::new(vec![course(1, &[10], &[], 100)]).unwrap();
        let err = catalog.course_for_chapter(99).unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dup_chapter = Catalog::new(vec![course(1, &[10], &[], 100), course(2, &[10], &[], 200)]);
        assert!(matches!(dup_chapter, Err(Error::Catalog(_))));

        let dup_course = Catalog::new(vec![course(1, &[10], &[], 100), course(1, &[11], &[], 200)]);
        assert!(matches!(dup_course, Err(Error::Catalog(_))));

        let shared_exam = Catalog::new(vec![course(1, &[10], &[], 100), course(2, &[20], &[], 100)]);
        assert!(matches!(shared_exam, Err(Error::Catalog(_))));
    }

    #[test]
    fn test_next_course() {
        let catalog = Catalog::new(vec![course(1, &[10], &[], 100), course(5, &[50], &[], 500)])
            .unwrap();
        assert_eq!(catalog.next_course(1).unwrap().map(|c| c.id), Some(5));
        assert!(catalog.next_course(5).unwrap().is_none());
        assert!(catalog.next_course(3).is_err());
    }

    #[test]
    fn test_next_chapter_navigation() {
        let catalog = Catalog::new(vec![
            course(1, &[10, 11], &[], 100),
            course(2, &[], &[], 200),
            course(3, &[30], &[], 300),
        ])
        .unwrap();

        assert_eq!(
            catalog.next_chapter(10).unwrap(),
            NextChapter::InCourse { chapter_id: 11 }
        );
        // Course 2 has no chapters and is skipped
        assert_eq!(
            catalog.next_chapter(11).unwrap(),
            NextChapter::FirstOfNextCourse {
                course_id: 3,
                chapter_id: 30
            }
        );
        assert_eq!(catalog.next_chapter(30).unwrap(), NextChapter::EndOfCurriculum);
        assert!(catalog.next_chapter(99).is_err());
    }

    #[test]
    fn test_parse_toml() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[course]]
            id = 2
            chapters = [20]

            [course.exam]
            id = 200
            display_name = "Second exam"

            [[course]]
            id = 1
            title = "Foundations"
            chapters = [10, 11]
            tasks = [1000, 1001]

            [course.exam]
            id = 100
            display_name = "Foundations exam"
            question_amount = 5
            time_limit_minutes = 10
            "#,
        )
        .unwrap();

        assert_eq!(catalog.courses()[0].title, "Foundations");
        assert_eq!(catalog.courses()[0].task_ids, vec![1000, 1001]);
        assert_eq!(catalog.exam(200).unwrap().question_amount, 10);
        assert_eq!(catalog.exam(100).unwrap().time_limit_minutes, 10);
    }

    #[test]
    fn test_parse_rejects_missing_exam() {
        let result = Catalog::from_toml_str(
            r#"
            [[course]]
            id = 1
            chapters = [10]
            "#,
        );
        assert!(matches!(result, Err(Error::Catalog(_))));
    }
}
