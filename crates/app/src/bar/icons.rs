//! Nerd Font glyphs used by the bar modules.

// Clock
pub const CALENDAR: &str = "󰃶"; // nf-md-calendar_today
pub const CLOCK: &str = "󰅐"; // nf-md-clock_outline

// Network
pub const WIFI: &str = "󰖩"; // nf-md-wifi
pub const ETHERNET: &str = "󰈀"; // nf-md-ethernet
pub const UPLOAD: &str = "󰕒"; // nf-md-upload
pub const DOWNLOAD: &str = "󰇚"; // nf-md-download
pub const IP: &str = "󰩟"; // nf-md-ip_network

// Media
pub const MUSIC: &str = "󰝚"; // nf-md-music
pub const VOLUME_HIGH: &str = "󰕾"; // nf-md-volume_high
pub const VOLUME_LOW: &str = "󰕿"; // nf-md-volume_low
pub const VOLUME_MUTE: &str = "󰝟"; // nf-md-volume_mute
pub const VOLUME_OFF: &str = "󰖁"; // nf-md-volume_off

// Kubernetes
pub const SHIP_WHEEL: &str = "󰠳"; // nf-md-ship_wheel

// System
pub const CHART: &str = "󰄪"; // nf-md-chart_line
pub const DESKTOP: &str = "󰇅"; // nf-md-desktop_tower
pub const UPTIME: &str = "󰖜"; // nf-md-weather_sunset_up
pub const MEMORY: &str = "󰍛"; // nf-md-memory
pub const SWAP: &str = "󰾴"; // nf-md-swap_horizontal
pub const FAN: &str = "󰈐"; // nf-md-fan
pub const HARDDISK: &str = "󰋊"; // nf-md-harddisk
pub const HOME: &str = "󰚡"; // nf-md-home_outline
pub const SWAP_VERTICAL: &str = "󰓢"; // nf-md-swap_vertical

// Weather
pub const SUNNY: &str = "󰖙"; // nf-md-weather_sunny
pub const NIGHT: &str = "󰖔"; // nf-md-weather_night
pub const PARTLY_CLOUDY: &str = "󰖕"; // nf-md-weather_partly_cloudy
pub const CLOUDY: &str = "󰖐"; // nf-md-weather_cloudy
pub const POURING: &str = "󰖖"; // nf-md-weather_pouring
pub const SHOWER: &str = "󰖗"; // nf-md-weather_rainy
pub const SNOWY: &str = "󰖘"; // nf-md-weather_snowy
pub const STORMY: &str = "󰖓"; // nf-md-weather_lightning
pub const FOG: &str = "󰖑"; // nf-md-weather_fog
pub const WINDY: &str = "󰖝"; // nf-md-weather_windy
pub const SUNRISE: &str = "󰖜"; // nf-md-weather_sunset_up
pub const SUNSET: &str = "󰖛"; // nf-md-weather_sunset_down
pub const HUMIDITY: &str = "󰖎"; // nf-md-water_percent
pub const WARNING: &str = "󰀦"; // nf-md-alert
