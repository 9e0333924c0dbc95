use sqlx::{Executor, Result, Sqlite};

use super::{ImageId, ImageRecord, NewImage};

/// 添加图片记录
pub async fn add_image<'c, E>(executor: E, image: &NewImage<'_>) -> Result<ImageId>
where
    E: Executor<'c, Database = Sqlite>,
{
    let (id,): (ImageId,) = sqlx::query_as(
        r#"
        INSERT INTO image (name, data, digest, embedding)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(image.name)
    .bind(image.data)
    .bind(image.digest.as_bytes().as_slice())
    .bind(image.embedding.as_slice())
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// 按原 ID 写回图片记录，重复执行结果相同
pub async fn put_image<'c, E>(executor: E, image: &ImageRecord) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO image (id, name, data, digest, embedding)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(image.id)
    .bind(&image.name)
    .bind(&image.data)
    .bind(&image.digest)
    .bind(&image.embedding)
    .execute(executor)
    .await?;

    Ok(())
}

/// 根据摘要查找图片
pub async fn get_image_by_digest<'c, E>(executor: E, digest: &[u8]) -> Result<Option<ImageRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as(
        r#"
        SELECT id, name, data, digest, embedding FROM image WHERE digest = ?
        "#,
    )
    .bind(digest)
    .fetch_optional(executor)
    .await
}

pub async fn get_image_by_id<'c, E>(executor: E, id: ImageId) -> Result<Option<ImageRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as(
        r#"
        SELECT id, name, data, digest, embedding FROM image WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// 获取全部图片，按 ID 升序
pub async fn get_images<'c, E>(executor: E) -> Result<Vec<ImageRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as(
        r#"
        SELECT id, name, data, digest, embedding FROM image ORDER BY id ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn get_image_ids<'c, E>(executor: E) -> Result<Vec<ImageId>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar(r#"SELECT id FROM image ORDER BY id ASC"#).fetch_all(executor).await
}

/// 删除所有图片，返回删除的行数
pub async fn delete_images_all<'c, E>(executor: E) -> Result<u64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query(r#"DELETE FROM image"#).execute(executor).await?;
    Ok(result.rows_affected())
}

pub async fn get_meta<'c, E>(executor: E, key: &str) -> Result<Option<String>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar(r#"SELECT value FROM meta WHERE key = ?"#)
        .bind(key)
        .fetch_optional(executor)
        .await
}

pub async fn set_meta<'c, E>(executor: E, key: &str, value: &str) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(r#"INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)"#)
        .bind(key)
        .bind(value)
        .execute(executor)
        .await?;
    Ok(())
}
