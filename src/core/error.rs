//! Typed error handling for the marketplace core
//!
//! Every failure the cart and order services can produce is a variant of
//! [`MarketError`]. Each variant knows its HTTP status code and a stable
//! machine-readable code, so handlers can return errors with `?` and let the
//! [`IntoResponse`] implementation render the `{ "error": ... }` body.
//!
//! # Error Categories
//!
//! - [`CartError`]: cart mutations (missing lines, seller rules)
//! - [`OrderError`]: checkout and the order status state machine
//! - [`RequestError`]: authentication, authorization and malformed requests
//! - [`ValidationError`]: invalid field values (quantities, ids, statuses)
//! - [`StorageError`]: repository failures
//! - [`ConfigError`]: configuration parsing and validation
//!
//! # Example
//!
//! ```rust,ignore
//! use marketplace::prelude::*;
//!
//! match cart_service.add_item(&principal, product_id, 2).await {
//!     Ok(cart) => println!("{} items", cart.total_items),
//!     Err(err) if err.kind() == ErrorKind::Conflict => println!("mixed sellers"),
//!     Err(err) => eprintln!("{}", err),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::entities::order::OrderStatus;

/// The main error type for the marketplace core
#[derive(Debug)]
pub enum MarketError {
    /// Cart errors
    Cart(CartError),

    /// Order and checkout errors
    Order(OrderError),

    /// HTTP/Request errors (authentication, authorization, body parsing)
    Request(RequestError),

    /// Invalid input values
    Validation(ValidationError),

    /// Storage backend errors
    Storage(StorageError),

    /// Configuration errors
    Config(ConfigError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

/// Coarse error taxonomy shared by every error variant
///
/// This is the classification clients and tests care about; the concrete
/// variants carry the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    InvalidArgument,
    NotFound,
    Conflict,
    InvalidTransition,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidTransition => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketError::Cart(e) => write!(f, "{}", e),
            MarketError::Order(e) => write!(f, "{}", e),
            MarketError::Request(e) => write!(f, "{}", e),
            MarketError::Validation(e) => write!(f, "{}", e),
            MarketError::Storage(e) => write!(f, "{}", e),
            MarketError::Config(e) => write!(f, "{}", e),
            MarketError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for MarketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarketError::Cart(e) => Some(e),
            MarketError::Order(e) => Some(e),
            MarketError::Request(e) => Some(e),
            MarketError::Validation(e) => Some(e),
            MarketError::Storage(e) => Some(e),
            MarketError::Config(e) => Some(e),
            MarketError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl MarketError {
    /// Classify this error into the shared taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::Cart(e) => e.kind(),
            MarketError::Order(e) => e.kind(),
            MarketError::Request(e) => e.kind(),
            MarketError::Validation(_) => ErrorKind::InvalidArgument,
            MarketError::Storage(_) => ErrorKind::Internal,
            MarketError::Config(_) => ErrorKind::Internal,
            MarketError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            MarketError::Cart(e) => e.error_code(),
            MarketError::Order(e) => e.error_code(),
            MarketError::Request(e) => e.error_code(),
            MarketError::Validation(_) => "INVALID_ARGUMENT",
            MarketError::Storage(_) => "STORAGE_ERROR",
            MarketError::Config(_) => "CONFIG_ERROR",
            MarketError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            MarketError::Order(OrderError::InvalidTransition { from, to }) => {
                Some(serde_json::json!({ "from": from, "to": to }))
            }
            MarketError::Cart(CartError::MixedSeller {
                cart_seller,
                product_seller,
            }) => Some(serde_json::json!({
                "cartSeller": cart_seller.to_string(),
                "productSeller": product_seller.to_string()
            })),
            MarketError::Validation(ValidationError::FieldError { field, .. }) => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        }
    }

    /// Shorthand for a forbidden operation
    pub fn forbidden(message: impl Into<String>) -> Self {
        MarketError::Request(RequestError::Forbidden {
            message: message.into(),
        })
    }

    /// Shorthand for a missing or invalid principal
    pub fn unauthorized(message: impl Into<String>) -> Self {
        MarketError::Request(RequestError::Unauthorized {
            message: message.into(),
        })
    }

    /// Shorthand for an invalid field value
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        MarketError::Validation(ValidationError::FieldError {
            field: field.into(),
            message: message.into(),
        })
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Cart Errors
// =============================================================================

/// Errors related to cart operations
#[derive(Debug)]
pub enum CartError {
    /// Referenced product does not exist
    ProductNotFound { product_id: Uuid },

    /// The caller has no cart
    CartNotFound,

    /// The cart has no line for this product
    ItemNotInCart { product_id: Uuid },

    /// A seller tried to add their own product
    OwnProduct { product_id: Uuid },

    /// The product belongs to another seller than the cart's items
    MixedSeller {
        cart_seller: Uuid,
        product_seller: Uuid,
    },
}

impl fmt::Display for CartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartError::ProductNotFound { product_id } => {
                write!(f, "Product '{}' not found", product_id)
            }
            CartError::CartNotFound => write!(f, "Cart not found"),
            CartError::ItemNotInCart { product_id } => {
                write!(f, "Product '{}' not in cart", product_id)
            }
            CartError::OwnProduct { .. } => {
                write!(f, "Seller cannot add their own product to cart")
            }
            CartError::MixedSeller { .. } => {
                write!(f, "Cart can only contain products from the same seller")
            }
        }
    }
}

impl std::error::Error for CartError {}

impl CartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::ProductNotFound { .. } => ErrorKind::NotFound,
            CartError::CartNotFound => ErrorKind::NotFound,
            CartError::ItemNotInCart { .. } => ErrorKind::NotFound,
            CartError::OwnProduct { .. } => ErrorKind::Forbidden,
            CartError::MixedSeller { .. } => ErrorKind::Conflict,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CartError::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            CartError::CartNotFound => "CART_NOT_FOUND",
            CartError::ItemNotInCart { .. } => "CART_ITEM_NOT_FOUND",
            CartError::OwnProduct { .. } => "OWN_PRODUCT",
            CartError::MixedSeller { .. } => "MIXED_SELLER_CART",
        }
    }
}

impl From<CartError> for MarketError {
    fn from(err: CartError) -> Self {
        MarketError::Cart(err)
    }
}

// =============================================================================
// Order Errors
// =============================================================================

/// Errors related to checkout and order status management
#[derive(Debug)]
pub enum OrderError {
    /// Order id does not resolve
    NotFound { order_id: Uuid },

    /// A line references a product that does not exist
    ProductNotFound { product_id: Uuid },

    /// Checkout without explicit items and without a cart
    NothingToOrder,

    /// Buyer tried to order their own product
    OwnProduct { product_id: Uuid },

    /// Status change not allowed by the transition table
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::NotFound { order_id } => write!(f, "Order '{}' not found", order_id),
            OrderError::ProductNotFound { product_id } => {
                write!(f, "Product '{}' not found", product_id)
            }
            OrderError::NothingToOrder => write!(f, "No items to create order"),
            OrderError::OwnProduct { .. } => write!(f, "Cannot order own product"),
            OrderError::InvalidTransition { from, to } => {
                write!(f, "Invalid status transition from {} to {}", from, to)
            }
        }
    }
}

impl std::error::Error for OrderError {}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NotFound { .. } => ErrorKind::NotFound,
            OrderError::ProductNotFound { .. } => ErrorKind::NotFound,
            OrderError::NothingToOrder => ErrorKind::InvalidArgument,
            OrderError::OwnProduct { .. } => ErrorKind::Forbidden,
            OrderError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OrderError::NotFound { .. } => "ORDER_NOT_FOUND",
            OrderError::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            OrderError::NothingToOrder => "EMPTY_CHECKOUT",
            OrderError::OwnProduct { .. } => "OWN_PRODUCT",
            OrderError::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}

impl From<OrderError> for MarketError {
    fn from(err: OrderError) -> Self {
        MarketError::Order(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// Missing or invalid principal
    Unauthorized { message: String },

    /// Authenticated but not permitted
    Forbidden { message: String },

    /// Invalid request body
    InvalidBody { message: String },

    /// Invalid id in the path
    InvalidId { value: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Unauthorized { message } => write!(f, "Not authorized: {}", message),
            RequestError::Forbidden { message } => write!(f, "Forbidden: {}", message),
            RequestError::InvalidBody { message } => write!(f, "Invalid request body: {}", message),
            RequestError::InvalidId { value } => write!(f, "Invalid id format: '{}'", value),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Unauthorized { .. } => ErrorKind::Unauthorized,
            RequestError::Forbidden { .. } => ErrorKind::Forbidden,
            RequestError::InvalidBody { .. } => ErrorKind::InvalidArgument,
            RequestError::InvalidId { .. } => ErrorKind::InvalidArgument,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
            RequestError::Forbidden { .. } => "FORBIDDEN",
            RequestError::InvalidBody { .. } => "INVALID_BODY",
            RequestError::InvalidId { .. } => "INVALID_ID",
        }
    }
}

impl From<RequestError> for MarketError {
    fn from(err: RequestError) -> Self {
        MarketError::Request(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Single field validation error
    FieldError { field: String, message: String },

    /// Missing required argument
    MissingArgument { argument: String },

    /// Status string is not a member of the status enum
    InvalidStatus { value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldError { field, message } => {
                write!(f, "Invalid '{}': {}", field, message)
            }
            ValidationError::MissingArgument { argument } => {
                write!(f, "{} is required", argument)
            }
            ValidationError::InvalidStatus { value } => write!(f, "Invalid status '{}'", value),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for MarketError {
    fn from(err: ValidationError) -> Self {
        MarketError::Validation(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Connection error
    ConnectionError { backend: String, message: String },

    /// A repository call failed
    OperationFailed { message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionError { backend, message } => {
                write!(f, "Failed to connect to {}: {}", backend, message)
            }
            StorageError::OperationFailed { message } => {
                write!(f, "Storage operation failed: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for MarketError {
    fn from(err: StorageError) -> Self {
        MarketError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::IoError { message } => write!(f, "IO error: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for MarketError {
    fn from(err: ConfigError) -> Self {
        MarketError::Config(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        MarketError::Request(RequestError::InvalidBody {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for MarketError {
    fn from(err: serde_yaml::Error) -> Self {
        MarketError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        MarketError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<jsonwebtoken::errors::Error> for MarketError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        MarketError::Request(RequestError::Unauthorized {
            message: err.to_string(),
        })
    }
}

/// Repositories report failures through `anyhow`; anything that reaches the
/// service layer that way is a storage failure.
impl From<anyhow::Error> for MarketError {
    fn from(err: anyhow::Error) -> Self {
        MarketError::Storage(StorageError::OperationFailed {
            message: format!("{:#}", err),
        })
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;
