use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OpenWeatherMap 5-day / 3-hour forecast payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub cod: String,
    pub message: f64,
    pub cnt: i32,
    pub list: Vec<ForecastItem>,
    pub city: ForecastCity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: ForecastMain,
    pub weather: Vec<WeatherCondition>,
    pub clouds: ForecastClouds,
    pub wind: ForecastWind,
    pub visibility: Option<i32>,
    pub pop: f64,
    pub rain: Option<HashMap<String, f64>>,
    pub snow: Option<HashMap<String, f64>>,
    pub sys: ForecastSys,
    pub dt_txt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub sea_level: Option<f64>,
    pub grnd_level: Option<f64>,
    pub humidity: i32,
    pub temp_kf: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastClouds {
    pub all: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastWind {
    pub speed: f64,
    pub deg: f64,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSys {
    pub pod: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastCity {
    pub id: i64,
    pub name: String,
    pub coord: ForecastCoord,
    pub country: String,
    pub population: Option<i64>,
    pub timezone: i32,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastCoord {
    pub lat: f64,
    pub lon: f64,
}
