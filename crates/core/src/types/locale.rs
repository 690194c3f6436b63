//! Languages and localized user-facing messages.
//!
//! Every failure the shopper can see is a [`Message`]; it is rendered in the
//! session's language at the last moment, never stored as text.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Storefront display language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl Language {
    /// Parse an ISO 639-1 code. `kw` is the backend's alias for Arabic.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ar" | "kw" => Some(Self::Ar),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }

    /// Text direction for the `dir` attribute.
    #[must_use]
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Ar => "rtl",
            Self::En => "ltr",
        }
    }

    #[must_use]
    pub const fn is_arabic(self) -> bool {
        matches!(self, Self::Ar)
    }
}

/// A user-facing message, localized on display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Message {
    GuestBootstrapFailed,
    GuestNotReady,
    RequiredFieldsMissing,
    ShippingNotChosen,
    PaymentNotChosen,
    CartEmpty,
    CartNotSynced,
    AddressSaveFailed,
    ShippingSaveFailed,
    ShippingUnavailable,
    ShippingOptionsFailed,
    InvalidShippingOption,
    InvalidPaymentMethod,
    PaymentMethodsFailed,
    CountryListFailed,
    CountryListUnauthorized,
    CountryListUnreachable,
    /// Digital payment accepted without a gateway link; carries the
    /// backend's own message.
    MissingRedirectLink(String),
    /// Backend refused a submission step; carries the backend's message.
    BackendRejected(String),
    PaymentFormUnavailable,
    PaymentNotCompleted,
    PurchaseFailed,
}

impl Message {
    /// Render the message in `lang`.
    #[must_use]
    pub fn localize(&self, lang: Language) -> Cow<'static, str> {
        let ar = lang.is_arabic();
        let text = match self {
            Self::GuestBootstrapFailed => pick(
                ar,
                "تعذر الحصول على رقم الضيف. يرجى إعادة تحميل الصفحة.",
                "Could not create a guest session. Please reload the page.",
            ),
            Self::GuestNotReady => pick(
                ar,
                "يرجى الانتظار حتى يتم تجهيز الحساب المؤقت",
                "Please wait while your guest session is prepared",
            ),
            Self::RequiredFieldsMissing => pick(
                ar,
                "يرجى تعبئة جميع الحقول المطلوبة",
                "Please fill in all required fields",
            ),
            Self::ShippingNotChosen => {
                pick(ar, "يرجى اختيار طريقة التوصيل", "Please choose a delivery method")
            }
            Self::PaymentNotChosen => {
                pick(ar, "يرجى اختيار طريقة الدفع", "Please choose a payment method")
            }
            Self::CartEmpty => pick(ar, "السلة فارغة", "Your cart is empty"),
            Self::CartNotSynced => pick(
                ar,
                "السلة فارغة أو لم يتم مزامنتها مع الخادم بعد. يرجى إضافة منتجات وإعادة المحاولة.",
                "Your cart is empty or has not synced with the server yet. Please add products and try again.",
            ),
            Self::AddressSaveFailed => pick(
                ar,
                "فشل حفظ العنوان. يرجى المحاولة مرة أخرى.",
                "Saving the address failed. Please try again.",
            ),
            Self::ShippingSaveFailed => pick(
                ar,
                "تعذر حفظ طريقة الشحن المختارة. يرجى المحاولة مرة أخرى.",
                "Could not save the selected shipping method. Please try again.",
            ),
            Self::ShippingUnavailable => pick(
                ar,
                "لا توجد خيارات شحن متاحة حالياً لهذا البائع. جرب تحديث الصفحة أو التواصل مع الدعم.",
                "No shipping options are available for this seller right now. Try refreshing or contact support.",
            ),
            Self::ShippingOptionsFailed => pick(
                ar,
                "تعذر تحميل خيارات الشحن",
                "Could not load shipping options",
            ),
            Self::InvalidShippingOption => pick(
                ar,
                "طريقة الشحن المختارة غير متاحة",
                "The selected shipping method is not available",
            ),
            Self::InvalidPaymentMethod => pick(
                ar,
                "طريقة الدفع المختارة غير متاحة",
                "The selected payment method is not available",
            ),
            Self::PaymentMethodsFailed => pick(
                ar,
                "فشل تحميل طرق الدفع من الخادم",
                "Loading payment methods from the server failed",
            ),
            Self::CountryListFailed => pick(
                ar,
                "تعذر تحميل قائمة الدول. يرجى إعادة المحاولة لاحقاً.",
                "Could not load the country list. Please try again later.",
            ),
            Self::CountryListUnauthorized => pick(
                ar,
                "غير مصرح. يرجى إعادة تحميل الصفحة أو تسجيل الدخول.",
                "Not authorized. Please reload the page or sign in.",
            ),
            Self::CountryListUnreachable => pick(
                ar,
                "تعذر تحميل قائمة الدول. يرجى التحقق من الاتصال أو المحاولة لاحقاً.",
                "Could not load the country list. Check your connection or try later.",
            ),
            Self::MissingRedirectLink(detail) => {
                return Cow::Owned(format!(
                    "No redirect_link received from backend! Error: {detail}"
                ));
            }
            Self::BackendRejected(detail) => return Cow::Owned(detail.clone()),
            Self::PaymentFormUnavailable => pick(
                ar,
                "تعذر تجهيز صفحة الدفع. يرجى المحاولة مرة أخرى.",
                "Could not prepare the payment page. Please try again.",
            ),
            Self::PaymentNotCompleted => pick(
                ar,
                "لم تكتمل عملية الدفع. يرجى المحاولة مرة أخرى.",
                "The payment was not completed. Please try again.",
            ),
            Self::PurchaseFailed => pick(
                ar,
                "حدث خطأ أثناء الشراء",
                "Something went wrong while placing your order",
            ),
        };
        Cow::Borrowed(text)
    }
}

const fn pick(arabic: bool, ar: &'static str, en: &'static str) -> &'static str {
    if arabic { ar } else { en }
}
