//! Resets the database and fills it with demo data: two users (one admin),
//! two job postings with one application, and two courses with one enrollment.
//!
//! Usage: `cargo run --bin seed` (reads `DATABASE_URL` like the server).

use seagro::{
    auth,
    config::AppConfig,
    models::{ApplyJobRequest, NewCourse, NewJob, NewUser},
    repository::{self, Repository, SqliteRepository},
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{error::Error, str::FromStr};

type SeedResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seagro=info,seed=info".into()),
        )
        .init();

    let config = AppConfig::load();

    let options = SqliteConnectOptions::from_str(&config.db_url)
        .expect("FATAL: DATABASE_URL is not a valid SQLite URL.")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("FATAL: Failed to open the database. Check DATABASE_URL.");

    repository::run_migrations(&pool)
        .await
        .expect("FATAL: Failed to apply database migrations.");

    if let Err(e) = seed(&pool).await {
        tracing::error!("Seeding failed: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Mock data has been added successfully");
}

async fn reset(pool: &SqlitePool) -> SeedResult<()> {
    // Children first so foreign keys never dangle.
    for table in [
        "course_enrollments",
        "job_applications",
        "courses",
        "jobs",
        "users",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(pool)
            .await?;
    }
    sqlx::query("DELETE FROM sqlite_sequence").execute(pool).await?;
    Ok(())
}

async fn seed(pool: &SqlitePool) -> SeedResult<()> {
    reset(pool).await?;
    let repo = SqliteRepository::new(pool.clone());

    let john = repo
        .create_user(NewUser {
            username: "john_doe".into(),
            email: "john@example.com".into(),
            password_hash: auth::hash_password("password123")?,
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            is_admin: true,
            ..NewUser::default()
        })
        .await?;

    let jane = repo
        .create_user(NewUser {
            username: "jane_smith".into(),
            email: "jane@example.com".into(),
            password_hash: auth::hash_password("password123")?,
            first_name: Some("Jane".into()),
            last_name: Some("Smith".into()),
            ..NewUser::default()
        })
        .await?;
    tracing::info!(admin = john.id, user = jane.id, "users created");

    let python_job = repo
        .create_job(
            NewJob {
                title: "Senior Python Developer".into(),
                company: "Tech Corp".into(),
                description: "Looking for an experienced Python developer...".into(),
                location: Some("San Francisco, CA".into()),
                requirements: Some(
                    "5+ years of Python experience\nExperience with Flask/Django".into(),
                ),
                salary: Some("$120k - $150k".into()),
            },
            john.id,
        )
        .await?;

    repo.create_job(
        NewJob {
            title: "Frontend Developer".into(),
            company: "Web Solutions".into(),
            description: "Join our team as a frontend developer...".into(),
            location: Some("Remote".into()),
            requirements: Some("3+ years of React experience\nStrong CSS skills".into()),
            salary: Some("$90k - $120k".into()),
        },
        john.id,
    )
    .await?;

    repo.create_application(
        python_job.id,
        jane.id,
        ApplyJobRequest {
            cover_letter: Some("I am very interested in this position...".into()),
            resume: Some("https://example.com/resume.pdf".into()),
        },
    )
    .await?;
    tracing::info!("jobs and applications created");

    let python_course = repo
        .create_course(NewCourse {
            title: "Python for Beginners".into(),
            description: "Learn Python from scratch".into(),
            content: [
                "Introduction to Python: Variables and Data Types, Control Flow",
                "Functions and Classes: Functions, Classes",
            ]
            .join("\n"),
        })
        .await?;

    repo.create_course(NewCourse {
        title: "Advanced Web Development".into(),
        description: "Master modern web development".into(),
        content: [
            "Modern JavaScript features",
            "React and Redux",
            "Node.js and Express",
            "MongoDB integration",
        ]
        .join("\n"),
    })
    .await?;

    repo.enroll(jane.id, python_course.id).await?;
    tracing::info!("courses and enrollments created");

    Ok(())
}
