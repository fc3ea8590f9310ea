use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::RecordKind;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        (
            Uuid::parse_str("7f3b2c61-88d2-4f4e-9a44-1f0d2b6f5c3a")?,
            "민지",
        ),
        (
            Uuid::parse_str("2a91c4de-5b17-4f0a-bb0f-8a7e3c1d9b42")?,
            "준호",
        ),
        (
            Uuid::parse_str("c8e5f2a0-3d6b-4c89-a1f7-54b2d8e90c13")?,
            "소연",
        ),
    ];

    for (id, nickname) in &users {
        sqlx::query(
            r#"
            INSERT INTO weekly_recap.users (id, nickname)
            VALUES ($1, $2)
            ON CONFLICT (nickname) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(nickname)
        .execute(pool)
        .await?;
    }

    let now = Utc::now();
    let records = vec![
        ("seed-001", "민지", "exercise", "한강에서 30분 러닝 완료!", 1i64),
        ("seed-002", "민지", "diet", "아침은 오트밀이랑 삶은 계란", 1),
        ("seed-003", "민지", "exercise", "헬스장 하체 웨이트", 3),
        ("seed-004", "민지", "diet", "점심 샐러드, 저녁 닭가슴살", 4),
        ("seed-005", "준호", "exercise", "퇴근 후 수영 1시간", 2),
        ("seed-006", "준호", "diet", "야식 참고 단백질 쉐이크", 2),
        ("seed-007", "소연", "exercise", "아침 요가 스트레칭", 5),
    ];

    for (source_key, nickname, kind, content, days_ago) in records {
        let user_id: Uuid =
            sqlx::query("SELECT id FROM weekly_recap.users WHERE nickname = $1")
                .bind(nickname)
                .fetch_one(pool)
                .await?
                .get("id");

        let created_at = now - Duration::days(days_ago);
        sqlx::query(
            r#"
            INSERT INTO weekly_recap.records
            (id, user_id, kind, content, photo_ref, created_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind)
        .bind(content)
        .bind(format!("photos/{source_key}.jpg"))
        .bind(created_at)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        nickname: String,
        kind: String,
        content: String,
        photo_ref: String,
        created_at: DateTime<Utc>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        RecordKind::parse(&row.kind)
            .with_context(|| format!("unknown record kind {:?}", row.kind))?;

        let user_id: Uuid = sqlx::query(
            r#"
            INSERT INTO weekly_recap.users (id, nickname)
            VALUES ($1, $2)
            ON CONFLICT (nickname) DO UPDATE
            SET nickname = EXCLUDED.nickname
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.nickname)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO weekly_recap.records
            (id, user_id, kind, content, photo_ref, created_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&row.kind)
        .bind(&row.content)
        .bind(&row.photo_ref)
        .bind(row.created_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
