use clap::{Parser, Subcommand};
use coursely::config::DATABASE_URL_ENV;
use coursely::error::{AppError, AppResult};
use coursely::gamification::Criterion;
use coursely::model::entity::{
    Answer, AnswerCreate, Badge, BadgeCreate, Course, CourseCreate, Lesson, LessonCreate, Module,
    ModuleCreate, Plan, PlanCreate, QuestionType, QuizQuestion, QuizQuestionCreate, UserEntity,
    UserEntityCreateUpdate,
};
use coursely::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use coursely::web::{AuthenticatedUser, UserRole};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the Coursely database", long_about = None)]
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

    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage quiz questions and their answers
    Quiz {
        #[command(subcommand)]
        action: QuizCommands,
    },

    /// Manage badges
    Badge {
        #[command(subcommand)]
        action: BadgeCommands,
    },

    /// Manage subscription plans
    Plan {
        #[command(subcommand)]
        action: PlanCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// student, instructor, company_admin or admin
        #[arg(long, default_value = "student")]
        role: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        /// Username of the owning instructor
        #[arg(long)]
        instructor: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        required_tier: i32,
        #[arg(long, default_value_t = false)]
        publish: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        /// Course title to attach the module to
        #[arg(long)]
        course_title: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        order_index: Option<i32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        #[arg(long)]
        course_title: String,
        /// Module title (within the course) to attach the lesson to
        #[arg(long)]
        module_title: String,
        #[arg(long)]
        title: String,
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: String,
        #[arg(long)]
        order_index: Option<i32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum QuizCommands {
    AddQuestion {
        /// Lesson title to attach the question to
        #[arg(long)]
        lesson_title: String,
        /// single_choice or string_cmp
        #[arg(long, default_value = "single_choice")]
        question_type: String,
        #[arg(long)]
        question: String,
        #[arg(long, default_value = "")]
        explanation: String,
    },
    AddAnswer {
        /// Question text to attach the answer to
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer_text: String,
        #[arg(long, default_value = "")]
        image: String,
        #[arg(long, default_value_t = false)]
        is_correct: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BadgeCommands {
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// lessons_completed, courses_completed, quiz_correct, points or streak
        #[arg(long)]
        criteria: String,
        #[arg(long)]
        threshold: i64,
        #[arg(long, default_value_t = 0)]
        points: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        tier: i32,
        #[arg(long, default_value_t = 0)]
        price_cents: i64,
        #[arg(long)]
        interval_days: Option<i32>,
    },
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::InvalidInput(message.into())
}

async fn find_course(mm: &ModelManager, actor: &AuthenticatedUser, title: &str) -> AppResult<Course> {
    Course::find_by_title(mm, actor, title)
        .await?
        .ok_or_else(|| invalid(format!("course `{title}` not found")))
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_url = std::env::var(DATABASE_URL_ENV)
        .map_err(|_| invalid(format!("{DATABASE_URL_ENV} is not set")))?;
    let mm = ModelManager::new(DbConnection::connect(&database_url)?);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { username, password, role } => {
                let role = UserRole::parse(&role).ok_or_else(|| invalid(format!("unknown role `{role}`")))?;
                let user = UserEntity::create_with_role(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        password_hash: coursely::auth::hash_password(&password)?,
                    },
                    role,
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { instructor, title, description, required_tier, publish } => {
                let owner = UserEntity::find_by_username(&mm, &actor, &instructor)
                    .await?
                    .ok_or_else(|| invalid(format!("user `{instructor}` not found")))?;
                // the course belongs to whoever creates it
                let owner_actor = AuthenticatedUser::new(owner.id(), owner.role());

                let course = Course::create(
                    &mm,
                    &owner_actor,
                    CourseCreate {
                        title,
                        description,
                        required_tier: Some(required_tier),
                        published: Some(publish),
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Module { action } => match action {
            ModuleCommands::Add { course_title, title, description, order_index } => {
                let course = find_course(&mm, &actor, &course_title).await?;
                let module = Module::create(
                    &mm,
                    &actor,
                    ModuleCreate {
                        course_id: course.id(),
                        title,
                        description,
                        order_index,
                    },
                )
                .await?;
                println!("Module created: {:?}", module);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add { course_title, module_title, title, file, order_index } => {
                let course = find_course(&mm, &actor, &course_title).await?;
                let module = Module::find_by_title(&mm, &actor, course.id(), &module_title)
                    .await?
                    .ok_or_else(|| invalid(format!("module `{module_title}` not found")))?;

                let content = std::fs::read_to_string(file)?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        module_id: module.id(),
                        title,
                        content,
                        order_index,
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },

        Commands::Quiz { action } => match action {
            QuizCommands::AddQuestion { lesson_title, question_type, question, explanation } => {
                let question_type = QuestionType::parse(&question_type)
                    .ok_or_else(|| invalid(format!("unknown question type `{question_type}`")))?;
                let lesson = Lesson::find_by_title(&mm, &actor, &lesson_title)
                    .await?
                    .ok_or_else(|| invalid(format!("lesson `{lesson_title}` not found")))?;

                let question = QuizQuestion::create(
                    &mm,
                    &actor,
                    QuizQuestionCreate {
                        lesson_id: lesson.id(),
                        question_type,
                        question,
                        explanation,
                    },
                )
                .await?;
                println!("Question created: {:?}", question);
            }

            QuizCommands::AddAnswer { question, answer_text, image, is_correct } => {
                let question_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM quiz_questions WHERE question = $1 LIMIT 1")
                        .bind(&question)
                        .fetch_optional(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?
                        .ok_or_else(|| invalid(format!("question `{question}` not found")))?;

                let answer = Answer::create(
                    &mm,
                    &actor,
                    AnswerCreate {
                        question_id,
                        answer_text,
                        image,
                        is_correct: Some(is_correct),
                    },
                )
                .await?;
                println!("Answer created: {:?}", answer);
            }
        },

        Commands::Badge { action } => match action {
            BadgeCommands::Add { code, name, description, criteria, threshold, points } => {
                let criteria = Criterion::parse(&criteria)
                    .ok_or_else(|| invalid(format!("unknown criteria `{criteria}`")))?;
                let badge = Badge::create(
                    &mm,
                    &actor,
                    BadgeCreate {
                        code,
                        name,
                        description,
                        criteria,
                        threshold,
                        points: Some(points),
                    },
                )
                .await?;
                println!("Badge created: {:?}", badge);
            }
        },

        Commands::Plan { action } => match action {
            PlanCommands::Add { code, name, tier, price_cents, interval_days } => {
                let data = PlanCreate {
                    code,
                    name,
                    tier,
                    price_cents,
                    interval_days,
                };
                data.validate().map_err(invalid)?;
                let plan = Plan::create(&mm, &actor, data).await?;
                println!("Plan created: {:?}", plan);
            }
        },
    }

    Ok(())
}
