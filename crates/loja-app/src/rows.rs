//! Row helpers shared by the services: typed decoding of gateway JSON rows
//! and central tenant/identity scoping of insert payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Decodes a row set into typed entities.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> AppResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(AppError::from))
        .collect()
}

/// Decodes exactly one row out of a write's returned representation.
pub(crate) fn decode_single<T: DeserializeOwned>(rows: Vec<Value>) -> AppResult<T> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Decode("operation returned no rows".to_string()))?;
    serde_json::from_value(row).map_err(AppError::from)
}

/// Serializes a form payload and stamps the tenant (and optionally the
/// issuing identity) onto it. Keeping the stamp here means no call site can
/// forget the scope.
pub(crate) fn scoped_row<T: Serialize>(
    payload: &T,
    store_id: &str,
    user_id: Option<&str>,
) -> AppResult<Value> {
    let mut value = serde_json::to_value(payload)?;
    let Some(object) = value.as_object_mut() else {
        return Err(AppError::Decode(
            "insert payload must serialize to a JSON object".to_string(),
        ));
    };

    object.insert(
        "store_id".to_string(),
        Value::String(store_id.to_string()),
    );
    if let Some(user_id) = user_id {
        object.insert("user_id".to_string(), Value::String(user_id.to_string()));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loja_core::types::NewCustomer;

    #[test]
    fn test_scoped_row_stamps_tenant() {
        let form = NewCustomer {
            name: "Maria".to_string(),
            ..Default::default()
        };

        let row = scoped_row(&form, "store-1", None).unwrap();
        assert_eq!(row["store_id"], "store-1");
        assert!(row.get("user_id").is_none());

        let row = scoped_row(&form, "store-1", Some("user-1")).unwrap();
        assert_eq!(row["user_id"], "user-1");
    }

    #[test]
    fn test_decode_single_requires_a_row() {
        let err = decode_single::<NewCustomer>(Vec::new()).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }
}
