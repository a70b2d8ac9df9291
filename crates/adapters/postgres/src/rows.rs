//! 原始查询结果行解码为 JSON

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sentinel_errors::{AppError, AppResult};
use sentinel_ports::RawRow;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use uuid::Uuid;

pub fn decode_rows(rows: &[PgRow]) -> AppResult<Vec<RawRow>> {
    rows.iter().map(decode_row).collect()
}

pub fn decode_row(row: &PgRow) -> AppResult<RawRow> {
    let mut out = RawRow::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = decode_column(row, index, column.type_info().name())
            .map_err(|e| {
                AppError::internal(format!(
                    "Failed to decode column '{}': {}",
                    column.name(),
                    e
                ))
            })?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOL" => Value::from(row.try_get::<bool, _>(index)?),
        "INT2" => Value::from(row.try_get::<i16, _>(index)?),
        "INT4" => Value::from(row.try_get::<i32, _>(index)?),
        "INT8" => Value::from(row.try_get::<i64, _>(index)?),
        "FLOAT4" => Value::from(f64::from(row.try_get::<f32, _>(index)?)),
        "FLOAT8" => Value::from(row.try_get::<f64, _>(index)?),
        "NUMERIC" => decimal_value(row.try_get::<Decimal, _>(index)?),
        "TIMESTAMPTZ" => Value::from(row.try_get::<DateTime<Utc>, _>(index)?.to_rfc3339()),
        "TIMESTAMP" => Value::from(row.try_get::<NaiveDateTime, _>(index)?.to_string()),
        "DATE" => Value::from(row.try_get::<NaiveDate, _>(index)?.to_string()),
        "TIME" => Value::from(row.try_get::<NaiveTime, _>(index)?.to_string()),
        "UUID" => Value::from(row.try_get::<Uuid, _>(index)?.to_string()),
        "BYTEA" => bytea_value(&row.try_get::<Vec<u8>, _>(index)?),
        "JSON" | "JSONB" => row.try_get::<Value, _>(index)?,
        "BOOL[]" => Value::from(row.try_get::<Vec<Option<bool>>, _>(index)?),
        "INT2[]" => Value::from(row.try_get::<Vec<Option<i16>>, _>(index)?),
        "INT4[]" => Value::from(row.try_get::<Vec<Option<i32>>, _>(index)?),
        "INT8[]" => Value::from(row.try_get::<Vec<Option<i64>>, _>(index)?),
        "FLOAT8[]" => Value::from(row.try_get::<Vec<Option<f64>>, _>(index)?),
        "TEXT[]" | "VARCHAR[]" => Value::from(row.try_get::<Vec<Option<String>>, _>(index)?),
        "UUID[]" => Value::from(
            row.try_get::<Vec<Option<Uuid>>, _>(index)?
                .into_iter()
                .map(|id| id.map(|id| id.to_string()))
                .collect::<Vec<_>>(),
        ),
        _ => match row.try_get::<String, _>(index) {
            Ok(text) => Value::from(text),
            // 枚举等用户类型的二进制格式即文本，其余类型保留原始字节
            Err(_) => match raw.as_str() {
                Ok(text) => Value::from(text),
                Err(_) => bytea_value(raw.as_bytes().map_err(sqlx::Error::Decode)?),
            },
        },
    };
    Ok(value)
}

/// 整数值输出为 JSON 整数，其余输出为浮点数，超出范围时输出十进制文本
fn decimal_value(value: Decimal) -> Value {
    if value.fract().is_zero() {
        if let Some(n) = value.to_i64() {
            return Value::from(n);
        }
    } else if let Some(f) = value.to_f64() {
        return Value::from(f);
    }
    Value::from(value.to_string())
}

/// PostgreSQL 的 bytea 十六进制文本格式
fn bytea_value(bytes: &[u8]) -> Value {
    Value::from(format!("\\x{}", hex::encode(bytes)))
}
