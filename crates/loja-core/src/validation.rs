//! # Validation Module
//!
//! Local input validation. These run before any remote call so a bad form
//! submission never reaches the gateway.

use crate::error::{ValidationError, ValidationResult};
use crate::types::{NewCustomer, NewExpense, NewProduct, StoreProfile};

// =============================================================================
// String Validators
// =============================================================================

/// A required, non-empty name field with a sane upper bound.
fn validate_required_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a customer name (required, non-empty).
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_required_name("name", name)
}

/// Validates a product name (required, non-empty).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_name("name", name)
}

/// Validates a store display name (required, non-empty).
pub fn validate_store_name(name: &str) -> ValidationResult<()> {
    validate_required_name("name", name)
}

/// Validates an expense description (required, non-empty).
pub fn validate_expense_description(description: &str) -> ValidationResult<()> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale price in cents. Zero is allowed (free items), negative
/// is not.
pub fn validate_sale_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "sale_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates an expense amount in cents. Must be strictly positive.
pub fn validate_expense_amount_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates a line quantity. Must be strictly positive.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates a customer form payload before insert/update.
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_customer_name(&customer.name)
}

/// Validates a product form payload before insert/update.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_sale_price_cents(product.sale_price_cents)?;
    Ok(())
}

/// Validates an expense form payload before insert/update.
pub fn validate_new_expense(expense: &NewExpense) -> ValidationResult<()> {
    validate_expense_description(&expense.description)?;
    validate_expense_amount_cents(expense.amount_cents)?;
    Ok(())
}

/// Validates a store profile before creation or a settings update.
pub fn validate_store_profile(profile: &StoreProfile) -> ValidationResult<()> {
    validate_store_name(&profile.name)?;
    if let Some(tax_id) = profile.tax_id.as_deref() {
        if !tax_id.is_empty() {
            validate_company_tax_id(tax_id)?;
        }
    }
    Ok(())
}

// =============================================================================
// Brazilian Identifiers
// =============================================================================

/// Strips everything but digits from a formatted tax id or phone number.
pub fn normalize_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validates a company tax id (CNPJ): exactly 14 digits once normalized.
pub fn validate_company_tax_id(tax_id: &str) -> ValidationResult<()> {
    let digits = normalize_digits(tax_id);
    if digits.len() != 14 {
        return Err(ValidationError::InvalidFormat {
            field: "tax_id".to_string(),
            reason: "CNPJ must have 14 digits".to_string(),
        });
    }
    Ok(())
}

/// Validates a personal tax id (CPF): exactly 11 digits once normalized.
pub fn validate_personal_tax_id(tax_id: &str) -> ValidationResult<()> {
    let digits = normalize_digits(tax_id);
    if digits.len() != 11 {
        return Err(ValidationError::InvalidFormat {
            field: "tax_id".to_string(),
            reason: "CPF must have 11 digits".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
