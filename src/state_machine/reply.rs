//! Outbound replies and their fixed texts

use super::intent::{ADD_LOCATION_BUTTON, WEATHER_BUTTON};

/// Keyboard attached to a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    /// "check weather" and "add location" in one row
    Main,
}

impl Keyboard {
    pub fn rows(self) -> Vec<Vec<&'static str>> {
        match self {
            Keyboard::Main => vec![vec![WEATHER_BUTTON, ADD_LOCATION_BUTTON]],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_menu(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(Keyboard::Main),
        }
    }

    pub fn greeting() -> Self {
        Self::text(
            "Привет! Я твой погодный телеграм-бот! Воспользуйтесь командой /addcity для добавления города.",
        )
    }

    pub fn session_cleared() -> Self {
        Self::text("Сессия очищена.")
    }

    pub fn ask_location() -> Self {
        Self::text("Введите название города:")
    }

    pub fn no_locations() -> Self {
        Self::text("Вы еще не добавили города. Воспользуйтесь кнопкой \"Добавить город\".")
    }

    pub fn forecast_failed() -> Self {
        Self::with_menu("Произошла ошибка при получении погоды. Попробуйте позже.")
    }

    pub fn already_tracked(name: &str) -> Self {
        Self::with_menu(format!(
            "Город \"{name}\" уже есть в вашем списке городов. Введите другой город или выберите другое действие."
        ))
    }

    pub fn location_not_found(name: &str) -> Self {
        Self::text(format!(
            "Город \"{name}\" не найден. Пожалуйста, введите корректное название города."
        ))
    }

    pub fn location_added(name: &str) -> Self {
        Self::with_menu(format!("Город \"{name}\" добавлен! Выберите действие:"))
    }

    /// Sent instead of queueing when a user's inbox is full
    pub fn busy() -> Self {
        Self::text("Слишком много сообщений. Подождите ответа на предыдущие и повторите.")
    }
}
