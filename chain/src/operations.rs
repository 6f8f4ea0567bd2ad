//! Operations
//!
//! A closed set of operation kinds. Each kind validates against the state
//! without touching it (`evaluate`) and then mutates it (`apply`). Every
//! operation names the account it acts for; the transaction signer must
//! control that account.

use crate::error::{ChainError, Result};
use crate::state::ChainState;
use meta_backing::{
    committed_valuation, validate_limits, AssetLimitation, BackingError, Property,
    PropertyOptions, PropertyUpdate, ScheduleCalculator,
};
use meta_core::constants::MAX_SHARE_SUPPLY;
use meta_core::{AccountId, AssetAmount, ObjectId, Timestamp};
use meta_market::{validate_order, LimitOrder, MarketError};
use meta_oracle::{OracleError, PriceFeeds, UsdPrice};
use serde::{Deserialize, Serialize};

/// Behaviour shared by every operation kind
pub trait Evaluate {
    /// The account the operation acts for
    fn account(&self) -> AccountId;

    /// Validate against `state`. Never mutates.
    fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()>;

    /// Mutate `state`. Only called after a successful `evaluate`.
    fn apply(&self, state: &mut ChainState, signer: AccountId) -> Result<Option<ObjectId>>;
}

fn require_signer(signer: AccountId, account: AccountId) -> Result<()> {
    if signer != account {
        return Err(ChainError::Unauthorized { signer, account });
    }
    Ok(())
}

fn require_property_issuer(state: &ChainState, claim_id: u32, issuer: AccountId) -> Result<ObjectId> {
    let property = state.property(claim_id)?;
    if property.issuer != issuer {
        return Err(ChainError::Unauthorized {
            signer: issuer,
            account: property.issuer,
        });
    }
    Ok(property.id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssetLimitation {
    pub issuer: AccountId,
    pub symbol: String,
    pub sell_limit: String,
    pub buy_limit: String,
}

impl Evaluate for CreateAssetLimitation {
    fn account(&self) -> AccountId {
        self.issuer
    }

    fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()> {
        require_signer(signer, self.issuer)?;
        let issuer = state.account(self.issuer)?;
        if issuer.name != state.params.limitation_admin {
            return Err(ChainError::NotPermitted(issuer.name.clone()));
        }
        if state.asset(&self.symbol).is_none() {
            return Err(ChainError::UnknownAsset(self.symbol.clone()));
        }
        if state.limitation(&self.symbol).is_some() {
            return Err(ChainError::DuplicateLimitation(self.symbol.clone()));
        }
        validate_limits(&self.sell_limit, &self.buy_limit)?;
        Ok(())
    }

    fn apply(&self, state: &mut ChainState, _signer: AccountId) -> Result<Option<ObjectId>> {
        let limitation = AssetLimitation::new(
            state.limitations.next_id(),
            self.symbol.clone(),
            self.issuer,
            self.sell_limit.clone(),
            self.buy_limit.clone(),
        )?;
        let id = state.limitations.create(|_| limitation)?.id;
        log::info!("Created asset limitation {} for {}", id, self.symbol);
        Ok(Some(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAssetLimitation {
    pub issuer: AccountId,
    pub symbol: String,
    pub sell_limit: String,
    pub buy_limit: String,
}

impl Evaluate for UpdateAssetLimitation {
    fn account(&self) -> AccountId {
        self.issuer
    }

    fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()> {
        require_signer(signer, self.issuer)?;
        let limitation = state
            .limitation(&self.symbol)
            .ok_or_else(|| ChainError::LimitationNotFound(self.symbol.clone()))?;
        if limitation.issuer != self.issuer {
            return Err(ChainError::Unauthorized {
                signer: self.issuer,
                account: limitation.issuer,
            });
        }
        validate_limits(&self.sell_limit, &self.buy_limit)?;
        Ok(())
    }

    fn apply(&self, state: &mut ChainState, _signer: AccountId) -> Result<Option<ObjectId>> {
        let id = state
            .limitation(&self.symbol)
            .map(|r| r.id)
            .ok_or_else(|| ChainError::LimitationNotFound(self.symbol.clone()))?;
        state
            .limitations
            .modify(id, |l| l.set_limits(&self.sell_limit, &self.buy_limit))??;
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProperty {
    pub issuer: AccountId,
    pub claim_id: u32,
    pub options: PropertyOptions,
}

impl CreateProperty {
    fn build(&self, state: &ChainState) -> Result<Property> {
        Ok(Property::new(
            state.properties.next_id(),
            self.claim_id,
            self.issuer,
            self.options.clone(),
            state.head_block_time,
            &ScheduleCalculator::default(),
        )?)
    }
}

impl Evaluate for CreateProperty {
    fn account(&self) -> AccountId {
        self.issuer
    }

    fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()> {
        require_signer(signer, self.issuer)?;
        state.account(self.issuer)?;
        if state.properties.find(&self.claim_id).is_some() {
            return Err(ChainError::DuplicateClaimId(self.claim_id));
        }

        let property = self.build(state)?;
        let symbol = property.backing_asset();
        if state.limitation(symbol).is_none() {
            return Err(ChainError::LimitationNotFound(symbol.to_string()));
        }

        let committed = committed_valuation(state.properties_of(symbol), symbol)
            .saturating_add(property.full_contribution());
        if committed > MAX_SHARE_SUPPLY as u128 {
            return Err(BackingError::ValuationOverflow {
                symbol: symbol.to_string(),
                value: committed,
            }
            .into());
        }
        Ok(())
    }

    fn apply(&self, state: &mut ChainState, _signer: AccountId) -> Result<Option<ObjectId>> {
        let property = self.build(state)?;
        let id = state.properties.create(|_| property)?.id;
        log::info!(
            "Registered property {} (claim {}) backing {}",
            id,
            self.claim_id,
            self.options.backing_asset
        );
        Ok(Some(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProperty {
    pub issuer: AccountId,
    pub claim_id: u32,
    pub update: PropertyUpdate,
}

impl Evaluate for UpdateProperty {
    fn account(&self) -> AccountId {
        self.issuer
    }

    fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()> {
        require_signer(signer, self.issuer)?;
        if self.update.is_empty() {
            return Err(ChainError::InvalidOperation(
                "property update changes nothing".to_string(),
            ));
        }
        require_property_issuer(state, self.claim_id, self.issuer)?;
        let mut preview = state.property(self.claim_id)?.data.clone();
        preview.update_options(&self.update)?;
        Ok(())
    }

    fn apply(&self, state: &mut ChainState, _signer: AccountId) -> Result<Option<ObjectId>> {
        let id = require_property_issuer(state, self.claim_id, self.issuer)?;
        state
            .properties
            .modify(id, |p| p.update_options(&self.update))??;
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveProperty {
    pub issuer: AccountId,
    pub claim_id: u32,
}

impl Evaluate for ApproveProperty {
    fn account(&self) -> AccountId {
        self.issuer
    }

    fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()> {
        require_signer(signer, self.issuer)?;
        require_property_issuer(state, self.claim_id, self.issuer)?;
        let mut preview = state.property(self.claim_id)?.data.clone();
        preview.approve(state.head_block_time, &ScheduleCalculator::default())?;
        Ok(())
    }

    fn apply(&self, state: &mut ChainState, _signer: AccountId) -> Result<Option<ObjectId>> {
        let id = require_property_issuer(state, self.claim_id, self.issuer)?;
        let head = state.head_block_time;
        let calc = ScheduleCalculator::default();
        state.properties.modify(id, |p| p.approve(head, &calc))??;

        let property = state.property(self.claim_id)?;
        log::info!(
            "Approved property {} at {} ({})",
            self.claim_id,
            head,
            if property.restarted {
                "approval phase restarted"
            } else {
                "before the 25% point"
            }
        );
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteProperty {
    pub issuer: AccountId,
    pub claim_id: u32,
}

impl Evaluate for DeleteProperty {
    fn account(&self) -> AccountId {
        self.issuer
    }

    fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()> {
        require_signer(signer, self.issuer)?;
        require_property_issuer(state, self.claim_id, self.issuer)?;
        let property = state.property(self.claim_id)?;
        let symbol = property.backing_asset();
        let limitation = state
            .limitation(symbol)
            .ok_or_else(|| ChainError::LimitationNotFound(symbol.to_string()))?;

        let mut preview = limitation.data.clone();
        preview.subtract_contribution(property.contribution())?;
        Ok(())
    }

    fn apply(&self, state: &mut ChainState, _signer: AccountId) -> Result<Option<ObjectId>> {
        let id = require_property_issuer(state, self.claim_id, self.issuer)?;
        let property = state.property(self.claim_id)?;
        let symbol = property.backing_asset().to_string();
        let contribution = property.contribution();

        let limitation_id = state
            .limitation(&symbol)
            .map(|r| r.id)
            .ok_or_else(|| ChainError::LimitationNotFound(symbol.clone()))?;
        state
            .limitations
            .modify(limitation_id, |l| l.subtract_contribution(contribution))??;
        state.properties.remove(id)?;

        log::info!(
            "Deleted property {} and removed {} from {}",
            self.claim_id,
            contribution,
            symbol
        );
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishAssetPrice {
    pub publisher: AccountId,
    pub symbol: String,
    pub usd_price: UsdPrice,
}

impl Evaluate for PublishAssetPrice {
    fn account(&self) -> AccountId {
        self.publisher
    }

    fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()> {
        require_signer(signer, self.publisher)?;
        let publisher = state.account(self.publisher)?;
        if !state
            .params
            .publishers
            .is_authorized(&publisher.name, state.head_block_time)
        {
            return Err(OracleError::UnauthorizedPublisher(publisher.name.clone()).into());
        }
        PriceFeeds::check_publishable(
            state.asset(&self.symbol),
            &self.symbol,
            &state.params.core_symbol,
            &self.usd_price,
        )?;
        Ok(())
    }

    fn apply(&self, state: &mut ChainState, _signer: AccountId) -> Result<Option<ObjectId>> {
        let now = state.head_block_time;
        let id = state.feeds.publish(&self.symbol, self.usd_price, now)?;
        Ok(Some(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLimitOrder {
    pub seller: AccountId,
    pub amount_to_sell: AssetAmount,
    pub min_to_receive: AssetAmount,
    pub expiration: Timestamp,
}

impl Evaluate for CreateLimitOrder {
    fn account(&self) -> AccountId {
        self.seller
    }

    fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()> {
        require_signer(signer, self.seller)?;
        state.account(self.seller)?;
        for amount in [&self.amount_to_sell, &self.min_to_receive] {
            if state.asset(&amount.symbol).is_none() {
                return Err(MarketError::UnknownAsset(amount.symbol.clone()).into());
            }
        }
        validate_order(
            &self.amount_to_sell,
            &self.min_to_receive,
            self.expiration,
            state.head_block_time,
        )?;

        let core = state.params.core_symbol.as_str();
        state.params.guard().check(
            &self.amount_to_sell,
            &self.min_to_receive,
            core,
            &state.assets,
            state.limitation(core).map(|r| &r.data),
            &state.feeds,
            state.head_block_time,
        )?;
        Ok(())
    }

    fn apply(&self, state: &mut ChainState, _signer: AccountId) -> Result<Option<ObjectId>> {
        let created = state.head_block_time;
        let id = state
            .orders
            .create(|id| LimitOrder {
                id,
                seller: self.seller,
                amount_to_sell: self.amount_to_sell.clone(),
                min_to_receive: self.min_to_receive.clone(),
                expiration: self.expiration,
                created,
            })?
            .id;
        log::debug!(
            "Accepted order {} selling {} for {}",
            id,
            self.amount_to_sell,
            self.min_to_receive
        );
        Ok(Some(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateAssetLimitation(CreateAssetLimitation),
    UpdateAssetLimitation(UpdateAssetLimitation),
    CreateProperty(CreateProperty),
    UpdateProperty(UpdateProperty),
    ApproveProperty(ApproveProperty),
    DeleteProperty(DeleteProperty),
    PublishAssetPrice(PublishAssetPrice),
    CreateLimitOrder(CreateLimitOrder),
}

/// Expand to a match over every variant, binding the payload as `$op`
macro_rules! dispatch {
    ($self:expr, $op:ident => $body:expr) => {
        match $self {
            Operation::CreateAssetLimitation($op) => $body,
            Operation::UpdateAssetLimitation($op) => $body,
            Operation::CreateProperty($op) => $body,
            Operation::UpdateProperty($op) => $body,
            Operation::ApproveProperty($op) => $body,
            Operation::DeleteProperty($op) => $body,
            Operation::PublishAssetPrice($op) => $body,
            Operation::CreateLimitOrder($op) => $body,
        }
    };
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateAssetLimitation(_) => "create_asset_limitation",
            Operation::UpdateAssetLimitation(_) => "update_asset_limitation",
            Operation::CreateProperty(_) => "create_property",
            Operation::UpdateProperty(_) => "update_property",
            Operation::ApproveProperty(_) => "approve_property",
            Operation::DeleteProperty(_) => "delete_property",
            Operation::PublishAssetPrice(_) => "publish_asset_price",
            Operation::CreateLimitOrder(_) => "create_limit_order",
        }
    }

    pub fn account(&self) -> AccountId {
        dispatch!(self, op => op.account())
    }

    pub fn evaluate(&self, state: &ChainState, signer: AccountId) -> Result<()> {
        dispatch!(self, op => op.evaluate(state, signer))
    }

    /// Evaluate, then apply
    pub fn apply(&self, state: &mut ChainState, signer: AccountId) -> Result<Option<ObjectId>> {
        dispatch!(self, op => {
            op.evaluate(state, signer)?;
            op.apply(state, signer)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::Genesis;

    fn state() -> ChainState {
        let genesis = Genesis::from_json(
            r#"{
                "initial_timestamp": "2024-01-01T00:00:00Z",
                "accounts": ["committee", "alice", "bob"],
                "assets": [
                    { "symbol": "META1", "precision": 5, "max_supply": 45000000000000, "issuer": "committee" },
                    { "symbol": "USDT", "precision": 2, "max_supply": 1000000000000, "issuer": "committee" }
                ],
                "parameters": { "limitation_admin": "committee" }
            }"#,
        )
        .unwrap();
        ChainState::from_genesis(&genesis).unwrap()
    }

    const COMMITTEE: AccountId = AccountId(0);
    const ALICE: AccountId = AccountId(1);
    const BOB: AccountId = AccountId(2);

    fn create_limitation() -> Operation {
        Operation::CreateAssetLimitation(CreateAssetLimitation {
            issuer: COMMITTEE,
            symbol: "META1".to_string(),
            sell_limit: "0".to_string(),
            buy_limit: "1.5".to_string(),
        })
    }

    fn create_property(claim_id: u32, appraised_value: u64) -> Operation {
        Operation::CreateProperty(CreateProperty {
            issuer: ALICE,
            claim_id,
            options: PropertyOptions {
                title: "Warehouse".to_string(),
                description: String::new(),
                contact_email: "alice@example.com".to_string(),
                appraised_value,
                duration_minutes: 60,
                backing_asset: "META1".to_string(),
            },
        })
    }

    #[test]
    fn test_signer_must_control_account() {
        let st = state();
        assert!(matches!(
            create_limitation().evaluate(&st, ALICE),
            Err(ChainError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_only_admin_creates_limitations() {
        let st = state();
        let op = Operation::CreateAssetLimitation(CreateAssetLimitation {
            issuer: ALICE,
            symbol: "META1".to_string(),
            sell_limit: "0".to_string(),
            buy_limit: "1".to_string(),
        });
        assert!(matches!(op.evaluate(&st, ALICE), Err(ChainError::NotPermitted(_))));
    }

    #[test]
    fn test_limitation_lifecycle() {
        let mut st = state();
        create_limitation().apply(&mut st, COMMITTEE).unwrap();
        assert!(matches!(
            create_limitation().evaluate(&st, COMMITTEE),
            Err(ChainError::DuplicateLimitation(_))
        ));

        let update = Operation::UpdateAssetLimitation(UpdateAssetLimitation {
            issuer: COMMITTEE,
            symbol: "META1".to_string(),
            sell_limit: "2".to_string(),
            buy_limit: "0".to_string(),
        });
        assert!(matches!(
            update.evaluate(&st, COMMITTEE),
            Err(ChainError::Backing(BackingError::InvalidLimit(_)))
        ));

        let update = Operation::UpdateAssetLimitation(UpdateAssetLimitation {
            issuer: COMMITTEE,
            symbol: "META1".to_string(),
            sell_limit: "2".to_string(),
            buy_limit: "3.25".to_string(),
        });
        update.apply(&mut st, COMMITTEE).unwrap();
        let limitation = st.limitation("META1").unwrap();
        assert_eq!(limitation.buy_limit, "3.25");
        assert_eq!(limitation.revision, 1);
    }

    #[test]
    fn test_create_property_checks() {
        let mut st = state();
        assert!(matches!(
            create_property(7, 1_000).evaluate(&st, ALICE),
            Err(ChainError::LimitationNotFound(_))
        ));

        create_limitation().apply(&mut st, COMMITTEE).unwrap();
        create_property(7, 1_000).apply(&mut st, ALICE).unwrap();
        assert!(matches!(
            create_property(7, 1_000).evaluate(&st, ALICE),
            Err(ChainError::DuplicateClaimId(7))
        ));

        // committed value of live claims may not pass the max share supply
        let limit = MAX_SHARE_SUPPLY / 10;
        assert!(matches!(
            create_property(8, limit).evaluate(&st, ALICE),
            Err(ChainError::Backing(BackingError::ValuationOverflow { .. }))
        ));
        assert!(create_property(8, limit - 1_000).evaluate(&st, ALICE).is_ok());
    }

    #[test]
    fn test_only_property_issuer_may_change_it() {
        let mut st = state();
        create_limitation().apply(&mut st, COMMITTEE).unwrap();
        create_property(7, 1_000).apply(&mut st, ALICE).unwrap();

        let approve = Operation::ApproveProperty(ApproveProperty {
            issuer: BOB,
            claim_id: 7,
        });
        assert!(matches!(
            approve.evaluate(&st, BOB),
            Err(ChainError::Unauthorized { .. })
        ));

        let update = Operation::UpdateProperty(UpdateProperty {
            issuer: ALICE,
            claim_id: 7,
            update: PropertyUpdate {
                title: Some("Cold storage".to_string()),
                ..Default::default()
            },
        });
        update.apply(&mut st, ALICE).unwrap();
        assert_eq!(st.property(7).unwrap().options.title, "Cold storage");

        let empty = Operation::UpdateProperty(UpdateProperty {
            issuer: ALICE,
            claim_id: 7,
            update: PropertyUpdate::default(),
        });
        assert!(matches!(
            empty.evaluate(&st, ALICE),
            Err(ChainError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_approve_twice_fails() {
        let mut st = state();
        create_limitation().apply(&mut st, COMMITTEE).unwrap();
        create_property(7, 1_000).apply(&mut st, ALICE).unwrap();

        let approve = Operation::ApproveProperty(ApproveProperty {
            issuer: ALICE,
            claim_id: 7,
        });
        approve.apply(&mut st, ALICE).unwrap();
        assert!(matches!(
            approve.evaluate(&st, ALICE),
            Err(ChainError::Backing(BackingError::AlreadyApproved(7)))
        ));
    }

    #[test]
    fn test_publisher_allowlist() {
        let genesis = Genesis::from_json(
            r#"{
                "initial_timestamp": "2024-01-01T00:00:00Z",
                "accounts": ["committee", "meta1-oracle"],
                "assets": [
                    { "symbol": "META1", "precision": 5, "max_supply": 45000000000000, "issuer": "committee" },
                    { "symbol": "USDT", "precision": 2, "max_supply": 1000000000000, "issuer": "committee" }
                ],
                "parameters": { "limitation_admin": "committee" }
            }"#,
        )
        .unwrap();
        let mut st = ChainState::from_genesis(&genesis).unwrap();

        let publish = |publisher, symbol: &str| {
            Operation::PublishAssetPrice(PublishAssetPrice {
                publisher,
                symbol: symbol.to_string(),
                usd_price: UsdPrice::new(1, 1).unwrap(),
            })
        };

        assert!(matches!(
            publish(AccountId(0), "USDT").evaluate(&st, AccountId(0)),
            Err(ChainError::Oracle(OracleError::UnauthorizedPublisher(_)))
        ));
        assert!(matches!(
            publish(AccountId(1), "META1").evaluate(&st, AccountId(1)),
            Err(ChainError::Oracle(OracleError::CoreAsset(_)))
        ));
        publish(AccountId(1), "USDT")
            .apply(&mut st, AccountId(1))
            .unwrap();
        assert_eq!(st.feeds.get("USDT").unwrap().published, st.head_block_time);
    }

    #[test]
    fn test_operation_json_tagging() {
        let json = serde_json::to_string(&create_limitation()).unwrap();
        assert!(json.starts_with(r#"{"create_asset_limitation":"#));
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, create_limitation());
        assert_eq!(back.name(), "create_asset_limitation");
        assert_eq!(back.account(), COMMITTEE);
    }
}
