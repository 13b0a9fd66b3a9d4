//! Presentation tables for short codes
//!
//! Transaction status, severity, application kind and event codes are stored
//! in the log as short codes. They are mapped to display text through fixed
//! tables. Two revisions exist:
//!
//! - `Short` uses English names for status and severity and leaves
//!   application and event codes as stored
//! - `Long` uses the platform's localized long-form text for all four
//!
//! Codes missing from a table pass through unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which table revision to render codes with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    #[default]
    Short,
    Long,
}

impl Presentation {
    /// Display text for a transaction status code
    pub fn transaction_status<'a>(self, code: &'a str) -> &'a str {
        match TransactionStatus::from_code(code) {
            Some(status) => status.label(self),
            None => code,
        }
    }

    /// Display text for a severity code
    pub fn severity<'a>(self, code: &'a str) -> &'a str {
        match Severity::from_code(code) {
            Some(severity) => severity.label(self),
            None => code,
        }
    }

    /// Display text for an application kind
    pub fn application<'a>(self, code: &'a str) -> &'a str {
        match self {
            Self::Short => code,
            Self::Long => lookup(APPLICATIONS, code),
        }
    }

    /// Display text for an event code
    pub fn event<'a>(self, code: &'a str) -> &'a str {
        match self {
            Self::Short => code,
            Self::Long => lookup(EVENTS, code),
        }
    }
}

impl FromStr for Presentation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            other => Err(format!("unknown presentation '{other}', expected 'short' or 'long'")),
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => f.write_str("short"),
            Self::Long => f.write_str("long"),
        }
    }
}

/// Transaction state of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    Committed,
    RolledBack,
    InProgress,
    NotApplicable,
}

impl TransactionStatus {
    /// Parse the single-letter code stored in the log
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "U" => Some(Self::Committed),
            "C" => Some(Self::RolledBack),
            "R" => Some(Self::InProgress),
            "N" => Some(Self::NotApplicable),
            _ => None,
        }
    }

    pub fn label(self, presentation: Presentation) -> &'static str {
        match (presentation, self) {
            (Presentation::Short, Self::Committed) => "Committed",
            (Presentation::Short, Self::RolledBack) => "RolledBack",
            (Presentation::Short, Self::InProgress) => "InProgress",
            (Presentation::Short, Self::NotApplicable) => "NotApplicable",
            (Presentation::Long, Self::Committed) => "Зафиксирована",
            (Presentation::Long, Self::RolledBack) => "Отменена",
            (Presentation::Long, Self::InProgress) => "Не завершена",
            (Presentation::Long, Self::NotApplicable) => "Нет транзакции",
        }
    }
}

/// Event importance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Information,
    Error,
    Warning,
    Notification,
}

impl Severity {
    /// Parse the single-letter code stored in the log
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "I" => Some(Self::Information),
            "E" => Some(Self::Error),
            "W" => Some(Self::Warning),
            "N" => Some(Self::Notification),
            _ => None,
        }
    }

    pub fn label(self, presentation: Presentation) -> &'static str {
        match (presentation, self) {
            (Presentation::Short, Self::Information) => "Information",
            (Presentation::Short, Self::Error) => "Error",
            (Presentation::Short, Self::Warning) => "Warning",
            (Presentation::Short, Self::Notification) => "Notification",
            (Presentation::Long, Self::Information) => "Информация",
            (Presentation::Long, Self::Error) => "Ошибка",
            (Presentation::Long, Self::Warning) => "Предупреждение",
            (Presentation::Long, Self::Notification) => "Примечание",
        }
    }
}

// =============================================================================
// Long-form tables
// =============================================================================

fn lookup<'a>(table: &[(&str, &'static str)], code: &'a str) -> &'a str {
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map_or(code, |&(_, text)| text)
}

const APPLICATIONS: &[(&str, &str)] = &[
    ("1CV8", "Толстый клиент"),
    ("1CV8C", "Тонкий клиент"),
    ("WebClient", "Веб-клиент"),
    ("Designer", "Конфигуратор"),
    ("COMConnection", "Внешнее соединение (COM, обычное)"),
    ("COMConsole", "Внешнее соединение (COM, административное)"),
    ("WSConnection", "Сессия web-сервиса"),
    ("HTTPServiceConnection", "Соединение с HTTP-сервисом"),
    ("ODataConnection", "Стандартный интерфейс OData"),
    ("BackgroundJob", "Фоновое задание"),
    ("SystemBackgroundJob", "Системное фоновое задание"),
    ("SrvrConsole", "Консоль кластера"),
    ("JobScheduler", "Планировщик заданий"),
    ("Debugger", "Отладчик"),
    ("RAS", "Сервер администрирования"),
];

const EVENTS: &[(&str, &str)] = &[
    ("_$Session$_.Start", "Сеанс. Начало"),
    ("_$Session$_.Finish", "Сеанс. Завершение"),
    ("_$Session$_.Authentication", "Сеанс. Аутентификация"),
    ("_$Session$_.AuthenticationError", "Сеанс. Ошибка аутентификации"),
    ("_$Data$_.New", "Данные. Добавление"),
    ("_$Data$_.Update", "Данные. Изменение"),
    ("_$Data$_.Delete", "Данные. Удаление"),
    ("_$Data$_.Post", "Данные. Проведение"),
    ("_$Data$_.Unpost", "Данные. Отмена проведения"),
    ("_$Data$_.TotalsPeriodUpdate", "Данные. Изменение периода рассчитанных итогов"),
    ("_$Transaction$_.Begin", "Транзакция. Начало"),
    ("_$Transaction$_.Commit", "Транзакция. Фиксация"),
    ("_$Transaction$_.Rollback", "Транзакция. Отмена"),
    ("_$Job$_.Start", "Фоновое задание. Запуск"),
    ("_$Job$_.Succeed", "Фоновое задание. Успешное завершение"),
    ("_$Job$_.Fail", "Фоновое задание. Ошибка выполнения"),
    ("_$Job$_.Cancel", "Фоновое задание. Отмена"),
    ("_$Access$_.Access", "Доступ. Доступ"),
    ("_$Access$_.AccessDenied", "Доступ. Отказ в доступе"),
    ("_$InfoBase$_.ConfigUpdate", "Информационная база. Изменение конфигурации"),
    ("_$InfoBase$_.DBConfigUpdate", "Информационная база. Изменение конфигурации базы данных"),
    ("_$User$_.New", "Пользователи. Добавление"),
    ("_$User$_.Update", "Пользователи. Изменение"),
    ("_$User$_.Delete", "Пользователи. Удаление"),
];
