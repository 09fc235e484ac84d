use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "transaction_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(rename = "transactionTypeId")]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: StockDirection,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Direction a recorded movement pushes the product's stock in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    enum_name = "stock_direction",
    db_type = "String(StringLen::N(3))",
    rs_type = "String"
)]
pub enum StockDirection {
    #[sea_orm(string_value = "IN")]
    #[serde(rename = "IN")]
    Inbound,
    #[sea_orm(string_value = "OUT")]
    #[serde(rename = "OUT")]
    Outbound,
}

impl StockDirection {
    /// Signed stock change produced by recording a movement of `quantity`.
    pub fn applied_delta(self, quantity: i32) -> i32 {
        match self {
            StockDirection::Inbound => quantity,
            StockDirection::Outbound => -quantity,
        }
    }

    /// Signed stock change that undoes a recorded movement of `quantity`.
    /// Also the adjustment the update path applies to a quantity difference.
    pub fn reversal_delta(self, quantity: i32) -> i32 {
        -self.applied_delta(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::StockDirection;

    #[test]
    fn applied_delta_signs() {
        assert_eq!(StockDirection::Inbound.applied_delta(4), 4);
        assert_eq!(StockDirection::Outbound.applied_delta(4), -4);
    }

    #[test]
    fn reversal_delta_undoes_applied_delta() {
        for direction in [StockDirection::Inbound, StockDirection::Outbound] {
            assert_eq!(
                direction.applied_delta(7) + direction.reversal_delta(7),
                0
            );
        }
    }

    #[test]
    fn reversal_delta_on_quantity_difference() {
        //A grown OUT movement adjusts stock upward, a grown IN movement downward.
        assert_eq!(StockDirection::Outbound.reversal_delta(3), 3);
        assert_eq!(StockDirection::Inbound.reversal_delta(3), -3);
    }
}
