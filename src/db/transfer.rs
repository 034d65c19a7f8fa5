use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use super::queries::categories::{get_all_categories, import_categories};
use super::queries::questions::{get_all_questions, import_questions};
use super::{Category, Question};

const CATEGORIES_FILE: &str = "categories.csv";
const QUESTIONS_FILE: &str = "questions.csv";

fn write_to(path: &Path, data: Vec<impl Serialize>) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    for line in data {
        wtr.serialize(line)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_from<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut out = Vec::new();
    for record in rdr.deserialize() {
        let record: T = record.with_context(|| format!("Malformed row in {}", path.display()))?;
        out.push(record);
    }
    Ok(out)
}

/// Dumps categories and questions into `dir` as CSV, creating it if needed.
pub async fn export_data(pool: &SqlitePool, dir: &Path) -> anyhow::Result<()> {
    let categories = get_all_categories(pool).await?;
    let questions = get_all_questions(pool).await?;
    if !dir.exists() {
        std::fs::create_dir_all(dir)?
    }
    write_to(&dir.join(CATEGORIES_FILE), categories)?;
    write_to(&dir.join(QUESTIONS_FILE), questions)?;
    tracing::info!("Exported data to {}", dir.display());
    Ok(())
}

/// Loads a previous export. Both files are parsed before anything is written.
pub async fn import_data(pool: &SqlitePool, dir: &Path) -> anyhow::Result<()> {
    let categories: Vec<Category> = read_from(&dir.join(CATEGORIES_FILE))?;
    let questions: Vec<Question> = read_from(&dir.join(QUESTIONS_FILE))?;
    let (n_categories, n_questions) = (categories.len(), questions.len());
    import_categories(pool, categories)
        .await
        .context("Cannot import categories")?;
    import_questions(pool, questions)
        .await
        .context("Cannot import questions")?;
    tracing::info!("Imported {n_categories} categories and {n_questions} questions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::db::queries::{categories, questions};
    use crate::db::NewQuestion;

    #[tokio::test]
    async fn export_then_import_into_empty_database() {
        let source = memory_pool().await;
        let science = categories::create_category(&source, "Science").await.unwrap();
        questions::create_question(
            &source,
            &NewQuestion {
                question: "Who discovered penicillin, and when?".into(),
                answer: "Alexander Fleming".into(),
                category: science,
                difficulty: 3,
            },
        )
        .await
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dump");
        export_data(&source, &out).await.unwrap();
        assert!(out.join(CATEGORIES_FILE).exists());

        let target = memory_pool().await;
        import_data(&target, &out).await.unwrap();
        assert_eq!(
            get_all_questions(&target).await.unwrap(),
            get_all_questions(&source).await.unwrap()
        );
        assert_eq!(
            get_all_categories(&target).await.unwrap(),
            get_all_categories(&source).await.unwrap()
        );
    }

    #[tokio::test]
    async fn shipped_seed_imports() {
        let pool = memory_pool().await;
        let seed = Path::new(env!("CARGO_MANIFEST_DIR")).join("seed");
        import_data(&pool, &seed).await.unwrap();
        assert_eq!(categories::get_category_types(&pool).await.unwrap().len(), 6);
        assert!(!get_all_questions(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let pool = memory_pool().await;
        let dir = tempfile::tempdir().unwrap();
        assert!(import_data(&pool, &dir.path().join("nope")).await.is_err());
    }
}
