//! Localized page text.
//!
//! Error and status messages are `awis_core::Message`s; this is the static
//! chrome around them (headings, field labels, buttons).

use awis_core::Language;

/// Every fixed string the templates render.
#[derive(Debug)]
pub struct Labels {
    pub home: &'static str,
    pub cart: &'static str,
    pub switch_language: &'static str,
    pub shop_now: &'static str,

    pub cart_title: &'static str,
    pub cart_empty: &'static str,
    pub product: &'static str,
    pub quantity: &'static str,
    pub price: &'static str,
    pub line_total: &'static str,
    pub remove: &'static str,
    pub proceed_to_checkout: &'static str,
    pub continue_shopping: &'static str,

    pub checkout_address_info: &'static str,
    pub shipping_and_payment: &'static str,
    pub name: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub optional: &'static str,
    pub address_type: &'static str,
    pub address_type_permanent: &'static str,
    pub address_type_temporary: &'static str,
    pub country: &'static str,
    pub city: &'static str,
    pub postal: &'static str,
    pub street: &'static str,
    pub next: &'static str,
    pub back: &'static str,
    pub shipping_method: &'static str,
    pub fast_delivery: &'static str,
    pub payment_method: &'static str,
    pub online_payment: &'static str,
    pub save_choice: &'static str,
    pub place_order: &'static str,
    pub placing_order: &'static str,
    pub order_summary: &'static str,
    pub subtotal: &'static str,
    pub shipping: &'static str,
    pub total: &'static str,
    pub reload: &'static str,
    pub return_home: &'static str,

    pub redirecting_to_payment: &'static str,
    pub continue_to_payment: &'static str,

    pub order_confirmation: &'static str,
    pub order_success_title: &'static str,
    pub thank_you_for_order: &'static str,
    pub order_details: &'static str,
    pub order_id: &'static str,
    pub order_total: &'static str,
    pub currency_word: &'static str,
    pub order_success_message: &'static str,
    pub contact_support: &'static str,
    pub whatsapp: &'static str,
}

const AR: Labels = Labels {
    home: "الرئيسية",
    cart: "السلة",
    switch_language: "English",
    shop_now: "تسوق الآن",

    cart_title: "سلة التسوق",
    cart_empty: "السلة فارغة",
    product: "المنتج",
    quantity: "الكمية",
    price: "السعر",
    line_total: "المجموع",
    remove: "حذف",
    proceed_to_checkout: "إتمام الطلب",
    continue_shopping: "متابعة التسوق",

    checkout_address_info: "معلومات العنوان",
    shipping_and_payment: "الشحن والدفع",
    name: "الاسم",
    phone: "رقم الهاتف",
    email: "البريد الإلكتروني",
    optional: "اختياري",
    address_type: "نوع العنوان",
    address_type_permanent: "دائم",
    address_type_temporary: "مؤقت",
    country: "الدولة",
    city: "المدينة",
    postal: "الرمز البريدي",
    street: "العنوان",
    next: "التالي",
    back: "رجوع",
    shipping_method: "طريقة الشحن",
    fast_delivery: "توصيل سريع",
    payment_method: "طريقة الدفع",
    online_payment: "دفع إلكتروني",
    save_choice: "حفظ",
    place_order: "تأكيد الطلب",
    placing_order: "جاري إرسال الطلب...",
    order_summary: "ملخص الطلب",
    subtotal: "المجموع الفرعي",
    shipping: "الشحن",
    total: "الإجمالي",
    reload: "إعادة تحميل الصفحة",
    return_home: "العودة للرئيسية",

    redirecting_to_payment: "جاري تحويلك إلى صفحة الدفع...",
    continue_to_payment: "المتابعة إلى الدفع",

    order_confirmation: "تأكيد الطلب",
    order_success_title: "تم إرسال الطلب بنجاح!",
    thank_you_for_order: "شكراً لطلبك. سيتم التواصل معك قريباً.",
    order_details: "تفاصيل الطلب",
    order_id: "رقم الطلب",
    order_total: "إجمالي الطلب",
    currency_word: "د.ك",
    order_success_message: "سنقوم بتجهيز طلبك وإرساله في أقرب وقت.",
    contact_support: "للتواصل مع الدعم",
    whatsapp: "واتساب",
};

const EN: Labels = Labels {
    home: "Home",
    cart: "Cart",
    switch_language: "العربية",
    shop_now: "Shop now",

    cart_title: "Shopping cart",
    cart_empty: "Your cart is empty",
    product: "Product",
    quantity: "Quantity",
    price: "Price",
    line_total: "Total",
    remove: "Remove",
    proceed_to_checkout: "Checkout",
    continue_shopping: "Continue shopping",

    checkout_address_info: "Address information",
    shipping_and_payment: "Shipping & payment",
    name: "Name",
    phone: "Phone",
    email: "Email",
    optional: "optional",
    address_type: "Address type",
    address_type_permanent: "Permanent",
    address_type_temporary: "Temporary",
    country: "Country",
    city: "City",
    postal: "Postal code",
    street: "Address",
    next: "Next",
    back: "Back",
    shipping_method: "Shipping method",
    fast_delivery: "Fast Delivery",
    payment_method: "Payment method",
    online_payment: "Online payment",
    save_choice: "Save",
    place_order: "Place order",
    placing_order: "Placing your order...",
    order_summary: "Order summary",
    subtotal: "Subtotal",
    shipping: "Shipping",
    total: "Total",
    reload: "Reload the page",
    return_home: "Return home",

    redirecting_to_payment: "Taking you to the payment page...",
    continue_to_payment: "Continue to payment",

    order_confirmation: "Order confirmation",
    order_success_title: "Order placed successfully!",
    thank_you_for_order: "Thank you for your order. We will contact you soon.",
    order_details: "Order details",
    order_id: "Order number",
    order_total: "Order total",
    currency_word: "KWD",
    order_success_message: "We will prepare your order and ship it as soon as possible.",
    contact_support: "Contact support",
    whatsapp: "WhatsApp",
};

impl Labels {
    #[must_use]
    pub const fn for_language(lang: Language) -> &'static Self {
        match lang {
            Language::Ar => &AR,
            Language::En => &EN,
        }
    }
}
