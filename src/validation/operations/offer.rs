use super::{debit, issuer_exists, Holding, OperationOutcome};
use crate::amount::Amount;
use crate::error::ValidationError;
use crate::results::{ManageOfferResultCode, OperationInnerResult};
use crate::state::Effect;
use crate::transaction::{CreatePassiveOfferOp, ManageOfferOp};
use crate::types::{AccountEntry, Asset, OfferEntry, Price};
use crate::validation::context::OperationContext;

type Wrap = fn(ManageOfferResultCode) -> OperationInnerResult;

/// Arguments shared by manage and passive offers.
struct OfferRequest<'o> {
    selling: &'o Asset,
    buying: &'o Asset,
    amount: Amount,
    price: Price,
    offer_id: u64,
    passive: bool,
}

pub(super) async fn validate_manage(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &ManageOfferOp,
) -> Result<OperationOutcome, ValidationError> {
    let request = OfferRequest {
        selling: &op.selling,
        buying: &op.buying,
        amount: op.amount,
        price: op.price,
        offer_id: op.offer_id,
        passive: false,
    };
    check(ctx, source, request, OperationInnerResult::ManageOffer).await
}

pub(super) async fn validate_passive(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &CreatePassiveOfferOp,
) -> Result<OperationOutcome, ValidationError> {
    let request = OfferRequest {
        selling: &op.selling,
        buying: &op.buying,
        amount: op.amount,
        price: op.price,
        offer_id: 0,
        passive: true,
    };
    check(ctx, source, request, OperationInnerResult::CreatePassiveOffer).await
}

/// Amount of the buying asset an offer can bring in.
fn buying_amount(amount: Amount, price: Price) -> Option<Amount> {
    amount.checked_mul_div(price.n as i64, price.d as i64)
}

async fn check(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    req: OfferRequest<'_>,
    wrap: Wrap,
) -> Result<OperationOutcome, ValidationError> {
    let fail = |code: ManageOfferResultCode| -> Result<OperationOutcome, ValidationError> {
        Ok(OperationOutcome::failed(wrap(code)))
    };

    let malformed = !req.selling.is_valid()
        || !req.buying.is_valid()
        || req.selling == req.buying
        || req.amount.is_negative()
        || !req.price.is_positive()
        || (req.passive && !req.amount.is_positive())
        || (req.offer_id == 0 && req.amount == Amount::ZERO);
    if malformed {
        return fail(ManageOfferResultCode::Malformed);
    }

    let existing = if req.offer_id == 0 {
        None
    } else {
        match ctx.state().offer(req.offer_id).await? {
            Some(offer) if offer.seller_id == source.account_id => Some(offer),
            _ => return fail(ManageOfferResultCode::NotFound),
        }
    };

    if req.amount == Amount::ZERO {
        let Some(offer) = existing else {
            return fail(ManageOfferResultCode::Malformed);
        };
        return delete(ctx, source, offer, wrap).await;
    }

    // A new offer takes one more reserve out of the native balance
    let mut projected = source.clone();
    if existing.is_none() {
        projected.num_sub_entries += 1;
    }

    if !issuer_exists(ctx, req.selling).await? {
        return fail(ManageOfferResultCode::SellNoIssuer);
    }
    let Some(selling) = Holding::load(ctx, &projected, req.selling).await? else {
        return fail(ManageOfferResultCode::SellNoTrust);
    };
    if !selling.is_authorized() {
        return fail(ManageOfferResultCode::SellNotAuthorized);
    }

    if !issuer_exists(ctx, req.buying).await? {
        return fail(ManageOfferResultCode::BuyNoIssuer);
    }
    let Some(buying) = Holding::load(ctx, &projected, req.buying).await? else {
        return fail(ManageOfferResultCode::BuyNoTrust);
    };
    if !buying.is_authorized() {
        return fail(ManageOfferResultCode::BuyNotAuthorized);
    }

    let reserve = ctx.base_reserve();
    if existing.is_none() && !source.can_add_sub_entry(reserve) {
        return fail(ManageOfferResultCode::LowReserve);
    }

    // Obligations of the offer being replaced are freed up again
    let (old_selling, old_buying) = match &existing {
        Some(offer) => (
            if offer.selling == *req.selling { offer.amount } else { Amount::ZERO },
            if offer.buying == *req.buying {
                buying_amount(offer.amount, offer.price).unwrap_or(Amount::ZERO)
            } else {
                Amount::ZERO
            },
        ),
        None => (Amount::ZERO, Amount::ZERO),
    };

    if selling.available_to_send(reserve).saturating_add(old_selling) < req.amount {
        return fail(ManageOfferResultCode::Underfunded);
    }

    let Some(wanted) = buying_amount(req.amount, req.price) else {
        return fail(ManageOfferResultCode::LineFull);
    };
    if buying.available_to_receive().saturating_add(old_buying) < wanted {
        return fail(ManageOfferResultCode::LineFull);
    }

    let mut account = projected;
    let mut effects = Vec::new();
    book(&mut account, &selling, req.amount.saturating_sub(old_selling), Amount::ZERO, &mut effects);
    book(&mut account, &buying, Amount::ZERO, wanted.saturating_sub(old_buying), &mut effects);
    effects.push(Effect::PutAccount(account));

    if let Some(mut offer) = existing {
        offer.selling = req.selling.clone();
        offer.buying = req.buying.clone();
        offer.amount = req.amount;
        offer.price = req.price;
        effects.push(Effect::PutOffer(offer));
    }

    Ok(OperationOutcome::success(wrap(ManageOfferResultCode::Success), effects))
}

async fn delete(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    offer: OfferEntry,
    wrap: Wrap,
) -> Result<OperationOutcome, ValidationError> {
    let mut account = source.clone();
    account.num_sub_entries = account.num_sub_entries.saturating_sub(1);

    let mut effects = Vec::new();
    if let Some(selling) = Holding::load(ctx, source, &offer.selling).await? {
        book(&mut account, &selling, debit(offer.amount), Amount::ZERO, &mut effects);
    }
    if let Some(buying) = Holding::load(ctx, source, &offer.buying).await? {
        let released = buying_amount(offer.amount, offer.price).unwrap_or(Amount::ZERO);
        book(&mut account, &buying, Amount::ZERO, debit(released), &mut effects);
    }
    effects.push(Effect::PutAccount(account));
    effects.push(Effect::DeleteOffer(offer.offer_id));

    Ok(OperationOutcome::success(wrap(ManageOfferResultCode::Success), effects))
}

/// Adds liability deltas to wherever the asset is held.
fn book(
    account: &mut AccountEntry,
    holding: &Holding,
    selling: Amount,
    buying: Amount,
    effects: &mut Vec<Effect>,
) {
    match holding {
        Holding::Native(_) => {
            let liabilities = &mut account.liabilities;
            liabilities.selling = liabilities.selling.saturating_add(selling).max(Amount::ZERO);
            liabilities.buying = liabilities.buying.saturating_add(buying).max(Amount::ZERO);
        }
        Holding::Line(line) => {
            let mut line = line.clone();
            line.liabilities.selling = line.liabilities.selling.saturating_add(selling).max(Amount::ZERO);
            line.liabilities.buying = line.liabilities.buying.saturating_add(buying).max(Amount::ZERO);
            effects.push(Effect::PutTrustLine(line));
        }
        Holding::Issuer => {}
    }
}
