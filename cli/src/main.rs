use clap::{Parser, Subcommand, ValueEnum};
use coursa::model::entity::{
    Course, CourseCreate, Lesson, LessonCreate, Quiz, QuizCreate, UserEntity,
    UserEntityCreateUpdate,
};
use coursa::model::grading::{DEFAULT_PASSING_SCORE, QuizQuestion, QuizValidationError, validate_quiz};
use coursa::model::progress::update_course_progress;
use coursa::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use coursa::utils::validate::{validate_email, validate_password, validate_username};
use coursa::web::{AuthenticatedUser, UserRole};
use coursa::{Config, ConfigError};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the course platform DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage quizzes
    Quiz {
        #[command(subcommand)]
        action: QuizCommands,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RoleArg {
    Student,
    Teacher,
    Admin,
}

impl From<RoleArg> for UserRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Student => UserRole::Student,
            RoleArg::Teacher => UserRole::Teacher,
            RoleArg::Admin => UserRole::Admin,
        }
    }
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value = "student")]
        role: RoleArg,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        /// Username of the teacher owning the course
        #[arg(long)]
        teacher: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Publish {
        /// Course title
        #[arg(long)]
        course: String,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Course title to attach the lesson to
        #[arg(long)]
        course: String,
        #[arg(long)]
        title: String,
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: String,
        #[arg(long)]
        order_index: Option<i32>,
    },
}

/// Quiz management
#[derive(Subcommand, Debug)]
pub enum QuizCommands {
    Add {
        /// Course title to attach the quiz to
        #[arg(long)]
        course: String,
        #[arg(long)]
        title: String,
        /// Path to a JSON array of `{prompt, options, correct_option}`
        #[arg(long)]
        file: String,
        #[arg(long, default_value_t = DEFAULT_PASSING_SCORE)]
        passing_score: i32,
        #[arg(long)]
        max_attempts: Option<i32>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("quiz file is not valid JSON: {0}")]
    QuizFile(#[from] serde_json::Error),
    #[error("invalid quiz: {0}")]
    QuizInvalid(#[from] QuizValidationError),
    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },
    #[error("invalid account: {0}")]
    InvalidAccount(&'static str),
    #[error("{0}")]
    Rejected(String),
}

type CliResult<T> = Result<T, CliError>;

async fn course_by_title(mm: &ModelManager, actor: &AuthenticatedUser, title: &str) -> CliResult<Course> {
    Course::find_by_title(mm, actor, title)
        .await?
        .ok_or_else(|| CliError::NotFound {
            kind: "course",
            name: title.to_string(),
        })
}

/// Same rules the signup endpoint enforces.
fn validate_account(username: &str, email: &str, password: &str) -> CliResult<()> {
    validate_username(username).map_err(CliError::InvalidAccount)?;
    validate_email(email).map_err(CliError::InvalidAccount)?;
    validate_password(password).map_err(CliError::InvalidAccount)?;
    Ok(())
}

fn database_uri() -> CliResult<String> {
    if let Ok(uri) = std::env::var("DATABASE_URL") {
        return Ok(uri);
    }
    let config = Config::load(cfg!(debug_assertions))?;
    Ok(config.app().database_uri().to_string())
}

async fn run(args: Cli) -> CliResult<()> {
    let db_con = DbConnection::connect(&database_uri()?, 2)?;
    db_con.migrate().await?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                username,
                email,
                password,
                role,
            } => {
                validate_account(&username, &email, &password)?;
                let password_hash =
                    coursa::auth::hash_password(&password).map_err(DatabaseError::from)?;
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        email,
                        password_hash,
                        role: role.into(),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add {
                teacher,
                title,
                description,
            } => {
                let owner = UserEntity::find_by_username(&mm, &actor, &teacher)
                    .await?
                    .ok_or_else(|| CliError::NotFound {
                        kind: "user",
                        name: teacher.clone(),
                    })?;
                if owner.role() == UserRole::Student {
                    return Err(CliError::Rejected(format!(
                        "`{teacher}` is a student and cannot own courses"
                    )));
                }

                let owner = AuthenticatedUser::new(owner.id(), owner.role());
                let course =
                    Course::create(&mm, &owner, CourseCreate { title, description }).await?;
                println!("Course created: {:?}", course);
            }

            CourseCommands::Publish { course } => {
                let found = course_by_title(&mm, &actor, &course).await?;
                if Lesson::count_by_course(&mm, &actor, found.id()).await? == 0 {
                    return Err(CliError::Rejected(format!(
                        "course `{course}` has no lessons"
                    )));
                }
                let published = found.set_published(&mm, &actor, true).await?;
                println!("Course published: {:?}", published);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add {
                course,
                title,
                file,
                order_index,
            } => {
                let course = course_by_title(&mm, &actor, &course).await?;
                let content = std::fs::read_to_string(file)?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        course_id: course.id(),
                        title,
                        content,
                        order_index,
                    },
                )
                .await?;
                update_course_progress(&mm, &actor, course.id()).await?;
                println!("Lesson created: {:?}", lesson);
            }
        },

        Commands::Quiz { action } => match action {
            QuizCommands::Add {
                course,
                title,
                file,
                passing_score,
                max_attempts,
            } => {
                let course = course_by_title(&mm, &actor, &course).await?;
                let questions: Vec<QuizQuestion> =
                    serde_json::from_str(&std::fs::read_to_string(file)?)?;
                validate_quiz(&questions, passing_score, max_attempts)?;

                let quiz = Quiz::create(
                    &mm,
                    &actor,
                    QuizCreate {
                        course_id: course.id(),
                        title,
                        questions,
                        passing_score,
                        max_attempts,
                    },
                )
                .await?;
                update_course_progress(&mm, &actor, course.id()).await?;
                println!("Quiz created: {:?}", quiz);
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    if let Err(e) = run(args).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn account_rules_match_signup() {
        assert!(validate_account("alice", "alice@example.com", "password").is_ok());
        assert!(matches!(
            validate_account("a b", "alice@example.com", "password"),
            Err(CliError::InvalidAccount(_))
        ));
        assert!(matches!(
            validate_account("alice", "not-an-email", "password"),
            Err(CliError::InvalidAccount(_))
        ));
        assert!(matches!(
            validate_account("alice", "alice@example.com", "123"),
            Err(CliError::InvalidAccount(_))
        ));
    }
}
