//! Inbound text classification

/// Keyboard label that asks for the forecast of all tracked locations
pub const WEATHER_BUTTON: &str = "Узнать погоду";
/// Keyboard label that starts the add-location flow
pub const ADD_LOCATION_BUTTON: &str = "Добавить город";

/// What a single inbound message asks for, resolved once per event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Start,
    Clear,
    AddLocationCommand,
    AddLocationKeyboard,
    QueryWeather,
    FreeText(String),
}

impl Intent {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();

        if let Some(command) = command_name(trimmed) {
            match command {
                "start" => return Intent::Start,
                "clear" => return Intent::Clear,
                "addcity" => return Intent::AddLocationCommand,
                _ => {}
            }
        }

        match trimmed {
            WEATHER_BUTTON => Intent::QueryWeather,
            ADD_LOCATION_BUTTON => Intent::AddLocationKeyboard,
            _ => Intent::FreeText(text.to_string()),
        }
    }

    pub fn is_add_location(&self) -> bool {
        matches!(self, Intent::AddLocationCommand | Intent::AddLocationKeyboard)
    }
}

/// `/cmd@bot args` -> `cmd`
fn command_name(text: &str) -> Option<&str> {
    let word = text.strip_prefix('/')?.split_whitespace().next()?;
    let name = word.split('@').next().unwrap_or(word);
    (!name.is_empty()).then_some(name)
}
