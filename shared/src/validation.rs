//! Validation utilities for stock quantities and prices

use rust_decimal::Decimal;

use crate::models::StockUnit;

/// Validate that a quantity is not negative
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// Validate that a quantity is strictly positive
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate an optional unit price
pub fn validate_price(price: Option<Decimal>) -> Result<(), &'static str> {
    match price {
        Some(p) if p < Decimal::ZERO => Err("Price cannot be negative"),
        _ => Ok(()),
    }
}

/// Validate the supply chain of a unit: ordered >= received, nothing negative
/// except the manual adjustment, and committed supply never below zero.
pub fn validate_supply(unit: &StockUnit) -> Result<(), &'static str> {
    validate_quantity(unit.ordered_quantity)?;
    validate_quantity(unit.received_quantity)?;
    if unit.has_supply_source() && unit.received_quantity > unit.ordered_quantity {
        return Err("Received quantity cannot exceed ordered quantity");
    }
    if unit.committed_quantity() < Decimal::ZERO {
        return Err("Adjustment cannot bring committed supply below zero");
    }
    validate_price(unit.net_price)?;
    validate_price(unit.shipping_price)?;
    Ok(())
}

/// Check the shipping chain: shipped never exceeds sold nor physical stock
pub fn validate_shipment(
    sold: Decimal,
    shipped: Decimal,
    stock: Decimal,
) -> Result<(), &'static str> {
    if shipped > sold {
        return Err("Shipped quantity cannot exceed sold quantity");
    }
    if shipped > stock {
        return Err("Shipped quantity cannot exceed received stock");
    }
    Ok(())
}
