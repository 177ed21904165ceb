mod user;
pub use user::{ModerationAction, ModerationError, UserEntity, UserEntityCreateUpdate, UserFilter, UserStatus};

mod course;
pub use course::{Course, CourseCreate};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonWithStatusRow};

mod quiz;
pub use quiz::{Quiz, QuizCreate};

mod enrollment;
pub use enrollment::{EnrolledStudentRow, Enrollment, EnrollmentCreate, EnrollmentWithCourseRow};

mod lesson_progress;
pub use lesson_progress::LessonProgress;

mod quiz_submission;
pub use quiz_submission::{QuizSubmission, QuizSubmissionCreate};

mod stats;
pub use stats::PlatformStats;
