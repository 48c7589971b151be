use std::f64::consts::PI;

/// Daily inputs for a reference evapotranspiration estimate, already in SI units.
#[derive(Debug, Clone, PartialEq)]
pub struct EtInputs {
    pub t_min_c: f64,
    pub t_max_c: f64,
    /// Measured at 10 m.
    pub wind_speed_mps: f64,
    pub elevation_m: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
    pub latitude_deg: f64,
    pub plant_coefficient: f64,
    pub day_of_year: u32,
}

pub trait EvapotranspirationModel {
    /// Evapotranspiration in millimetres.
    fn rate_mm(&self, inputs: &EtInputs) -> f64;
}

/// FAO-56 Penman-Monteith, with solar radiation estimated from the temperature range since no
/// sunshine data is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fao56;

const KRS_INTERIOR: f64 = 0.16;
const ALBEDO: f64 = 0.23;
const STEFAN_BOLTZMANN_MJ: f64 = 4.903e-9;

impl EvapotranspirationModel for Fao56 {
    fn rate_mm(&self, inputs: &EtInputs) -> f64 {
        let t_max = inputs.t_max_c.max(inputs.t_min_c);
        let t_min = inputs.t_min_c.min(inputs.t_max_c);
        let t_mean = (t_max + t_min) / 2.0;

        let pressure = 101.3 * ((293.0 - 0.0065 * inputs.elevation_m) / 293.0).powf(5.26);
        let gamma = 0.000665 * pressure;
        let delta = 4098.0 * saturation_vapour_pressure(t_mean) / (t_mean + 237.3).powi(2);

        let es = (saturation_vapour_pressure(t_max) + saturation_vapour_pressure(t_min)) / 2.0;
        let ea = (saturation_vapour_pressure(t_min) * inputs.humidity_max / 100.0
            + saturation_vapour_pressure(t_max) * inputs.humidity_min / 100.0)
            / 2.0;

        let ra = extraterrestrial_radiation(inputs.latitude_deg, inputs.day_of_year);
        let rs = KRS_INTERIOR * (t_max - t_min).sqrt() * ra;
        let rso = (0.75 + 2e-5 * inputs.elevation_m) * ra;
        let rns = (1.0 - ALBEDO) * rs;
        let relative_shortwave = if rso > 0.0 { (rs / rso).min(1.0) } else { 0.0 };
        let rnl = STEFAN_BOLTZMANN_MJ * ((t_max + 273.16).powi(4) + (t_min + 273.16).powi(4)) / 2.0
            * (0.34 - 0.14 * ea.max(0.0).sqrt())
            * (1.35 * relative_shortwave - 0.35);
        let rn = rns - rnl;

        let u2 = inputs.wind_speed_mps * 4.87 / (67.8 * 10.0 - 5.42_f64).ln();

        let et0 = (0.408 * delta * rn + gamma * 900.0 / (t_mean + 273.0) * u2 * (es - ea).max(0.0))
            / (delta + gamma * (1.0 + 0.34 * u2));

        (et0 * inputs.plant_coefficient).max(0.0)
    }
}

fn saturation_vapour_pressure(t: f64) -> f64 {
    0.6108 * (17.27 * t / (t + 237.3)).exp()
}

fn extraterrestrial_radiation(latitude_deg: f64, day_of_year: u32) -> f64 {
    let phi = latitude_deg.to_radians();
    let j = day_of_year as f64;

    let dr = 1.0 + 0.033 * (2.0 * PI * j / 365.0).cos();
    let declination = 0.409 * (2.0 * PI * j / 365.0 - 1.39).sin();
    let sunset_angle = (-phi.tan() * declination.tan()).clamp(-1.0, 1.0).acos();

    24.0 * 60.0 / PI
        * 0.0820
        * dr
        * (sunset_angle * phi.sin() * declination.sin() + phi.cos() * declination.cos() * sunset_angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summer_day() -> EtInputs {
        EtInputs {
            t_min_c: 15.0,
            t_max_c: 30.0,
            wind_speed_mps: 2.5,
            elevation_m: 100.0,
            humidity_min: 40.0,
            humidity_max: 80.0,
            latitude_deg: 40.0,
            plant_coefficient: 1.0,
            day_of_year: 180,
        }
    }

    #[test]
    fn summer_day_is_in_plausible_range() {
        let et = Fao56.rate_mm(&summer_day());

        assert!(et > 3.0 && et < 9.0, "et = {}", et);
    }

    #[test]
    fn winter_day_evaporates_less() {
        let winter = EtInputs {
            t_min_c: -2.0,
            t_max_c: 5.0,
            day_of_year: 10,
            ..summer_day()
        };

        assert!(Fao56.rate_mm(&winter) < Fao56.rate_mm(&summer_day()));
    }

    #[test]
    fn scales_with_plant_coefficient_and_never_negative() {
        let full = Fao56.rate_mm(&summer_day());
        let grass = Fao56.rate_mm(&EtInputs {
            plant_coefficient: 0.5,
            ..summer_day()
        });

        assert!((grass - full / 2.0).abs() < 1e-9);
        assert_eq!(
            Fao56.rate_mm(&EtInputs {
                plant_coefficient: 0.0,
                ..summer_day()
            }),
            0.0
        );
    }
}
