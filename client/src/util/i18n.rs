//! Static locale dictionary.
//!
//! Lookup order is the requested locale, then [`FALLBACK_LOCALE`], then the
//! key itself, so a missing translation degrades to readable English or to
//! the raw key rather than an empty string.

#[cfg(test)]
#[path = "i18n_test.rs"]
mod i18n_test;

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    En,
    Ar,
}

pub const FALLBACK_LOCALE: Locale = Locale::En;

impl Locale {
    pub const ALL: [Self; 3] = [Self::Fr, Self::En, Self::Ar];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fr" => Some(Self::Fr),
            "en" => Some(Self::En),
            "ar" => Some(Self::Ar),
            _ => None,
        }
    }

    /// Arabic renders right-to-left.
    #[must_use]
    pub fn is_rtl(self) -> bool {
        self == Self::Ar
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translate `key`, falling back to English and then to the key.
#[must_use]
pub fn translate<'a>(locale: Locale, key: &'a str) -> &'a str {
    lookup(locale, key)
        .or_else(|| lookup(FALLBACK_LOCALE, key))
        .unwrap_or(key)
}

fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
    table(locale).iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn table(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::Fr => FR,
        Locale::En => EN,
        Locale::Ar => AR,
    }
}

const FR: &[(&str, &str)] = &[
    ("nav.dashboard", "Tableau de Bord"),
    ("nav.login", "Connexion"),
    ("nav.register", "Inscription"),
    ("nav.logout", "Se Déconnecter"),
    ("nav.anonymous", "Utilisateur Anonyme"),
    ("dashboard.title", "Tableau de Bord"),
    ("dashboard.subtitle", "Surveillez les prix en temps réel"),
    ("auth.login.success", "Connexion réussie!"),
    ("auth.login.error", "Erreur de connexion"),
    ("auth.register.success", "Compte créé avec succès!"),
    ("auth.register.error", "Erreur lors de la création du compte"),
    ("toast.anonymous", "Connecté en tant qu'anonyme"),
    ("chat.title", "Chat Communautaire"),
    ("chat.noMessages", "Aucun message pour l'instant"),
    ("chat.connecting", "Connexion au chat..."),
    ("chat.connected", "Connecté"),
    ("chat.disconnected", "Déconnecté"),
    ("stats.totalReports", "Prix Signalés"),
    ("stats.cities", "Villes Couvertes"),
    ("stats.products", "Produits Suivis"),
    ("stats.abnormalPrices", "Prix Anormaux"),
    ("alerts.title", "Alertes Prix"),
    ("alerts.empty", "Aucune alerte"),
    ("reports.title", "Prix Récents"),
    ("reports.empty", "Aucun résultat trouvé"),
    ("reports.abnormal", "Anormal"),
    ("reports.added", "Prix ajouté"),
    ("reports.addedOffline", "Prix ajouté localement"),
    ("reports.voted", "Vote enregistré"),
    ("map.loading", "Chargement de la carte..."),
    ("map.error", "Impossible de charger la carte"),
    ("map.displayed", "Prix affichés"),
    ("time.justNow", "à l'instant"),
    ("time.minutes", "il y a {n} min"),
    ("time.hours", "il y a {n} h"),
    ("time.days", "il y a {n} j"),
];

const EN: &[(&str, &str)] = &[
    ("nav.dashboard", "Dashboard"),
    ("nav.login", "Login"),
    ("nav.register", "Sign Up"),
    ("nav.logout", "Log Out"),
    ("nav.anonymous", "Anonymous User"),
    ("dashboard.title", "Dashboard"),
    ("dashboard.subtitle", "Monitor prices in real time"),
    ("auth.login.success", "Logged in successfully!"),
    ("auth.login.error", "Login error"),
    ("auth.register.success", "Account created successfully!"),
    ("auth.register.error", "Error while creating account"),
    ("toast.anonymous", "Logged in as guest"),
    ("chat.title", "Community Chat"),
    ("chat.noMessages", "No messages yet"),
    ("chat.connecting", "Connecting to chat..."),
    ("chat.connected", "Connected"),
    ("chat.disconnected", "Disconnected"),
    ("stats.totalReports", "Price Reports"),
    ("stats.cities", "Cities Covered"),
    ("stats.products", "Products Tracked"),
    ("stats.abnormalPrices", "Abnormal Prices"),
    ("alerts.title", "Price Alerts"),
    ("alerts.empty", "No alerts"),
    ("reports.title", "Recent Prices"),
    ("reports.empty", "No results found"),
    ("reports.abnormal", "Abnormal"),
    ("reports.added", "Price added"),
    ("reports.addedOffline", "Price added locally"),
    ("reports.voted", "Vote recorded"),
    ("map.loading", "Loading map..."),
    ("map.error", "Could not load the map"),
    ("map.displayed", "Prices shown"),
    ("time.justNow", "just now"),
    ("time.minutes", "{n} min ago"),
    ("time.hours", "{n} h ago"),
    ("time.days", "{n} d ago"),
];

// Incomplete: the report and map keys fall back to English.
const AR: &[(&str, &str)] = &[
    ("nav.dashboard", "لوحة التحكم"),
    ("nav.login", "تسجيل الدخول"),
    ("nav.register", "إنشاء حساب"),
    ("nav.logout", "تسجيل الخروج"),
    ("nav.anonymous", "مستخدم مجهول"),
    ("dashboard.title", "لوحة التحكم"),
    ("dashboard.subtitle", "راقب الأسعار لحظياً"),
    ("auth.login.success", "تم تسجيل الدخول بنجاح!"),
    ("auth.login.error", "خطأ في تسجيل الدخول"),
    ("auth.register.success", "تم إنشاء الحساب بنجاح!"),
    ("auth.register.error", "حدث خطأ أثناء إنشاء الحساب"),
    ("toast.anonymous", "تم تسجيل الدخول كضيف"),
    ("chat.title", "الدردشة المجتمعية"),
    ("chat.noMessages", "لا توجد رسائل حتى الآن"),
    ("chat.connected", "متصل"),
    ("chat.disconnected", "غير متصل"),
    ("stats.totalReports", "الأسعار المُبلّغ عنها"),
    ("stats.cities", "المدن المغطاة"),
    ("stats.products", "المنتجات المتابعة"),
    ("stats.abnormalPrices", "الأسعار غير الطبيعية"),
    ("alerts.title", "تنبيهات الأسعار"),
    ("time.justNow", "الآن"),
    ("time.minutes", "منذ {n} دقيقة"),
    ("time.hours", "منذ {n} ساعة"),
    ("time.days", "منذ {n} يوم"),
];
