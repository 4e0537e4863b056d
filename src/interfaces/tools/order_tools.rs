use super::{Tool, ToolRegistry, parse_args};
use crate::application::engine::{
    CheckoutRequest, DEFAULT_HISTORY_LIMIT, OrderEngine, PaymentRequest,
};
use crate::domain::customer::customer_identifier;
use crate::domain::money::{Currency, Money};
use crate::domain::order::{OrderId, OrderLine};
use crate::domain::payment::PaymentMethod;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Number, Value, json};
use std::sync::Arc;

/// Builds a registry holding every order tool, all sharing one engine.
pub fn order_tools(engine: Arc<OrderEngine>) -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    registry.register(GetMenu(engine.clone()));
    registry.register(GetPromo(engine.clone()));
    registry.register(SaveOrder(engine.clone()));
    registry.register(GetOrder(engine.clone()));
    registry.register(ProcessPayment(engine.clone()));
    registry.register(CollectCustomerInfo(engine.clone()));
    registry.register(GetCustomerOrderHistory(engine));
    registry
}

fn parse_order_id(raw: &str) -> Result<OrderId> {
    raw.trim()
        .parse::<OrderId>()
        .map_err(|_| OrderError::ValidationError(format!("invalid order id `{raw}`")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

pub struct GetMenu(Arc<OrderEngine>);

#[async_trait]
impl Tool for GetMenu {
    fn name(&self) -> &'static str {
        "get_menu"
    }

    fn description(&self) -> &'static str {
        "Lists every menu item with its price, category and availability."
    }

    async fn execute(&self, _input: Value) -> Result<Value> {
        let items = self.0.menu().await?;
        if items.is_empty() {
            return Ok(json!({ "items": [], "message": "No menu items found." }));
        }
        Ok(json!({ "items": to_json(&items)? }))
    }
}

#[derive(Debug, Deserialize)]
struct GetPromoArgs {
    promo_code: String,
    #[serde(default)]
    subtotal: Option<Money>,
}

pub struct GetPromo(Arc<OrderEngine>);

#[async_trait]
impl Tool for GetPromo {
    fn name(&self) -> &'static str {
        "get_promo"
    }

    fn description(&self) -> &'static str {
        "Looks up a promotion code and reports whether it applies, optionally to a given subtotal."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: GetPromoArgs = parse_args(input)?;
        let check = self.0.check_promotion(&args.promo_code, args.subtotal).await?;
        to_json(&check)
    }
}

#[derive(Debug, Deserialize)]
struct LineArg {
    item_id: String,
    quantity: Number,
}

#[derive(Debug, Deserialize)]
struct SaveOrderArgs {
    #[serde(default)]
    lines: Vec<LineArg>,
    #[serde(default)]
    promo_code: Option<String>,
    #[serde(default)]
    customer_name: Option<String>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    order_id: Option<String>,
}

pub struct SaveOrder(Arc<OrderEngine>);

#[async_trait]
impl Tool for SaveOrder {
    fn name(&self) -> &'static str {
        "save_order"
    }

    fn description(&self) -> &'static str {
        "Prices the requested lines, applies an optional promotion code and saves a pending order."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: SaveOrderArgs = parse_args(input)?;
        let lines = args
            .lines
            .iter()
            .map(|line| OrderLine::from_json_quantity(line.item_id.trim(), &line.quantity))
            .collect::<Result<Vec<_>>>()?;

        let mut request = CheckoutRequest::new(lines);
        if let Some(code) = args.promo_code {
            request = request.with_promotion(code);
        }
        if let Some(customer) =
            customer_identifier(args.customer_name.as_deref(), args.customer_email.as_deref())
        {
            request = request.for_customer(customer);
        }
        if let Some(raw) = args.order_id.as_deref() {
            request = request.with_order_id(parse_order_id(raw)?);
        }

        let order = self.0.aggregate(request).await?;
        let message = match order.customer.as_deref() {
            Some(customer) => format!("Order saved successfully for {customer}!"),
            None => "Order saved successfully!".to_string(),
        };
        Ok(json!({ "order": to_json(&order)?, "message": message }))
    }
}

#[derive(Debug, Deserialize)]
struct GetOrderArgs {
    order_id: String,
}

pub struct GetOrder(Arc<OrderEngine>);

#[async_trait]
impl Tool for GetOrder {
    fn name(&self) -> &'static str {
        "get_order"
    }

    fn description(&self) -> &'static str {
        "Fetches a saved order by id."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: GetOrderArgs = parse_args(input)?;
        let order = self.0.get_order(parse_order_id(&args.order_id)?).await?;
        Ok(json!({ "order": to_json(&order)? }))
    }
}

#[derive(Debug, Deserialize)]
struct ProcessPaymentArgs {
    order_id: String,
    amount: Money,
    #[serde(default)]
    currency: Option<String>,
    method: String,
}

pub struct ProcessPayment(Arc<OrderEngine>);

#[async_trait]
impl Tool for ProcessPayment {
    fn name(&self) -> &'static str {
        "process_payment"
    }

    fn description(&self) -> &'static str {
        "Pays a pending order in full. Methods: card, qr_transfer, cash_on_delivery."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: ProcessPaymentArgs = parse_args(input)?;
        let currency = match args.currency.as_deref() {
            Some(code) => Currency::new(code)?,
            None => self.0.settings().currency.clone(),
        };
        let payment = self
            .0
            .confirm_payment(PaymentRequest {
                order_id: parse_order_id(&args.order_id)?,
                amount: args.amount,
                currency,
                method: args.method.parse::<PaymentMethod>()?,
            })
            .await?;
        Ok(json!({
            "payment": to_json(&payment)?,
            "message": format!("Payment of {} {} received.", payment.amount, payment.currency),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct CustomerInfoArgs {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

pub struct CollectCustomerInfo(Arc<OrderEngine>);

#[async_trait]
impl Tool for CollectCustomerInfo {
    fn name(&self) -> &'static str {
        "collect_customer_info"
    }

    fn description(&self) -> &'static str {
        "Records the customer's name, email or phone for this conversation."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: CustomerInfoArgs = parse_args(input)?;
        let session = self
            .0
            .collect_customer_info(args.name, args.email, args.phone)
            .await?;
        let message = match session.name.as_deref() {
            Some(name) => format!("Thank you {name}! I've collected your information for this order."),
            None => "Thank you! I've collected your information for this order.".to_string(),
        };
        Ok(json!({ "session": to_json(&session)?, "message": message }))
    }
}

#[derive(Debug, Deserialize)]
struct HistoryArgs {
    #[serde(default)]
    customer_name: Option<String>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub struct GetCustomerOrderHistory(Arc<OrderEngine>);

#[async_trait]
impl Tool for GetCustomerOrderHistory {
    fn name(&self) -> &'static str {
        "get_customer_order_history"
    }

    fn description(&self) -> &'static str {
        "Lists a returning customer's most recent orders, newest first."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: HistoryArgs = parse_args(input)?;
        let customer =
            customer_identifier(args.customer_name.as_deref(), args.customer_email.as_deref())
                .ok_or_else(|| {
                    OrderError::ValidationError(
                        "Provide a customer name or email to look up order history".to_string(),
                    )
                })?;
        let limit = args.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        let orders = self.0.order_history(customer, limit).await?;
        if orders.is_empty() {
            return Ok(json!({
                "orders": [],
                "message": format!("No previous orders found for {customer}."),
            }));
        }
        Ok(json!({ "orders": to_json(&orders)? }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::EngineSettings;
    use crate::domain::menu::MenuItem;
    use crate::domain::promotion::Promotion;
    use crate::infrastructure::in_memory::{
        InMemoryCatalog, InMemoryOrderStore, InMemoryPromotionStore, InMemorySessionStore,
    };
    use crate::interfaces::tools::ToolCall;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn registry() -> ToolRegistry {
        let catalog = InMemoryCatalog::with_items([
            MenuItem::new("burger", "Burger", Money::new(dec!(5.00)).unwrap(), "mains"),
            MenuItem::new("fries", "Fries", Money::new(dec!(2.50)).unwrap(), "sides"),
        ]);
        let promotions = InMemoryPromotionStore::with_promotions([Promotion::new(
            "SAVE20",
            dec!(20),
            Money::new(dec!(10.00)).unwrap(),
            NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
        )
        .unwrap()]);
        let engine = OrderEngine::new(
            Box::new(catalog),
            Box::new(promotions),
            Box::new(InMemoryOrderStore::new()),
            Box::new(InMemorySessionStore::new()),
            EngineSettings::default(),
        );
        order_tools(Arc::new(engine))
    }

    async fn call(registry: &ToolRegistry, name: &str, args: Value) -> Value {
        registry.invoke(&ToolCall::new(name, args)).await
    }

    #[test]
    fn test_registers_all_tools() {
        let names: Vec<&str> = registry().descriptors().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "collect_customer_info",
                "get_customer_order_history",
                "get_menu",
                "get_order",
                "get_promo",
                "process_payment",
                "save_order",
            ]
        );
    }

    #[tokio::test]
    async fn test_save_then_pay() {
        let registry = registry();
        let saved = call(
            &registry,
            "save_order",
            json!({
                "lines": [{"item_id": "burger", "quantity": 2}, {"item_id": "fries", "quantity": 1.0}],
                "promo_code": "save20",
                "customer_name": "Ana",
            }),
        )
        .await;
        assert_eq!(saved["status"], "SUCCESS");
        assert_eq!(saved["order"]["subtotal"], "12.50");
        assert_eq!(saved["order"]["total"], "10.00");
        assert_eq!(saved["message"], "Order saved successfully for Ana!");

        let order_id = saved["order"]["id"].as_str().unwrap().to_string();
        let paid = call(
            &registry,
            "process_payment",
            json!({"order_id": order_id, "amount": "10.00", "method": "qr_transfer"}),
        )
        .await;
        assert_eq!(paid["status"], "SUCCESS");
        assert_eq!(paid["payment"]["method"], "qr_transfer");
        assert!(paid["payment"]["qr_payload"].as_str().unwrap().contains("amount=10.00"));

        let fetched = call(&registry, "get_order", json!({"order_id": order_id})).await;
        assert_eq!(fetched["order"]["status"], "paid");
    }

    #[tokio::test]
    async fn test_failures_are_enveloped() {
        let registry = registry();
        let empty = call(&registry, "save_order", json!({"lines": []})).await;
        assert_eq!(empty["status"], "FAILURE");
        assert_eq!(empty["kind"], "validation");

        let fractional = call(
            &registry,
            "save_order",
            json!({"lines": [{"item_id": "burger", "quantity": 1.5}]}),
        )
        .await;
        assert_eq!(fractional["status"], "FAILURE");

        let bad_id = call(&registry, "get_order", json!({"order_id": "nope"})).await;
        assert_eq!(bad_id["status"], "FAILURE");

        let missing_args = call(&registry, "get_promo", Value::Null).await;
        assert_eq!(missing_args["status"], "FAILURE");
    }

    #[tokio::test]
    async fn test_get_promo_reports_reason() {
        let registry = registry();
        let below = call(
            &registry,
            "get_promo",
            json!({"promo_code": "SAVE20", "subtotal": "5.00"}),
        )
        .await;
        assert_eq!(below["status"], "SUCCESS");
        assert_eq!(below["applicable"], false);
        assert_eq!(below["reason"], "below_minimum");

        let unknown = call(&registry, "get_promo", json!({"promo_code": "nope"})).await;
        assert_eq!(unknown["applicable"], false);
        assert_eq!(unknown["reason"], "not_found");
    }

    #[tokio::test]
    async fn test_history_prefers_email() {
        let registry = registry();
        call(
            &registry,
            "save_order",
            json!({
                "lines": [{"item_id": "fries", "quantity": 1}],
                "customer_name": "Ana",
                "customer_email": "ana@example.com",
            }),
        )
        .await;

        let by_email = call(
            &registry,
            "get_customer_order_history",
            json!({"customer_email": "ANA@example.com"}),
        )
        .await;
        assert_eq!(by_email["orders"].as_array().unwrap().len(), 1);

        let by_name = call(
            &registry,
            "get_customer_order_history",
            json!({"customer_name": "Bob"}),
        )
        .await;
        assert_eq!(by_name["orders"].as_array().unwrap().len(), 0);
        assert_eq!(by_name["message"], "No previous orders found for Bob.");

        let neither = call(&registry, "get_customer_order_history", json!({})).await;
        assert_eq!(neither["status"], "FAILURE");
    }

    #[tokio::test]
    async fn test_collect_customer_info() {
        let registry = registry();
        let ok = call(&registry, "collect_customer_info", json!({"name": "Ana"})).await;
        assert_eq!(ok["status"], "SUCCESS");
        assert_eq!(ok["session"]["name"], "Ana");

        let blank = call(&registry, "collect_customer_info", json!({"name": "  "})).await;
        assert_eq!(blank["status"], "FAILURE");
    }
}
