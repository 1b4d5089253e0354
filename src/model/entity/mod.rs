mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod company;
pub use company::{Company, CompanyCreate, CompanyMemberRow};

mod course;
pub use course::{Course, CourseCreate, CourseStatsRow, ModuleWithLessonsRow};

mod module;
pub use module::{Module, ModuleCreate};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonWithStatusRow};

mod quiz;
pub use quiz::{QuestionType, QuizQuestion, QuizQuestionCreate, grade_answer, text_answer_matches};

mod answer;
pub use answer::{Answer, AnswerCreate};

mod quiz_attempt;
pub use quiz_attempt::{QuizAttempt, QuizAttemptCreate};

mod enrollment;
pub use enrollment::{Enrollment, EnrollmentProgressRow};

mod lesson_progress;
pub use lesson_progress::LessonProgress;

mod activity;
pub use activity::{Activity, ActivityKind, LeaderboardRow};

mod badge;
pub use badge::{Badge, BadgeCreate, EarnedBadgeRow};

mod challenge;
pub use challenge::{Challenge, ChallengeCreate, ChallengeMembershipRow};

mod plan;
pub use plan::{Plan, PlanCreate};

mod subscription;
pub use subscription::{Subscription, SubscriptionStatus, SubscriptionWithPlanRow, grants_access};

mod reaction;
pub use reaction::{Reaction, ReactionKind, ReactionTarget, ToggleAction, toggle_action};

mod refresh_token;
pub use refresh_token::RefreshToken;
