//! Public holidays observed in the province of Milan.
//!
//! National Italian holidays plus Sant'Ambrogio, the patron saint of Milan.
//! Easter is computed with the anonymous Gregorian algorithm.

use chrono::{Datelike, Days, NaiveDate};

/// A public holiday in Milan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Holiday {
    Capodanno,
    Epifania,
    Pasqua,
    LunediDellAngelo,
    FestaDellaLiberazione,
    FestaDeiLavoratori,
    FestaDellaRepubblica,
    AssunzioneDellaVergine,
    TuttiISanti,
    SantAmbrogio,
    ImmacolataConcezione,
    Natale,
    SantoStefano,
}

impl Holiday {
    pub const ALL: [Holiday; 13] = [
        Holiday::Capodanno,
        Holiday::Epifania,
        Holiday::Pasqua,
        Holiday::LunediDellAngelo,
        Holiday::FestaDellaLiberazione,
        Holiday::FestaDeiLavoratori,
        Holiday::FestaDellaRepubblica,
        Holiday::AssunzioneDellaVergine,
        Holiday::TuttiISanti,
        Holiday::SantAmbrogio,
        Holiday::ImmacolataConcezione,
        Holiday::Natale,
        Holiday::SantoStefano,
    ];

    /// Italian name of the holiday
    pub fn label(&self) -> &'static str {
        match self {
            Holiday::Capodanno => "Capodanno",
            Holiday::Epifania => "Epifania del Signore",
            Holiday::Pasqua => "Pasqua di Resurrezione",
            Holiday::LunediDellAngelo => "Lunedì dell'Angelo",
            Holiday::FestaDellaLiberazione => "Festa della Liberazione",
            Holiday::FestaDeiLavoratori => "Festa dei Lavoratori",
            Holiday::FestaDellaRepubblica => "Festa della Repubblica",
            Holiday::AssunzioneDellaVergine => "Assunzione della Vergine",
            Holiday::TuttiISanti => "Tutti i Santi",
            Holiday::SantAmbrogio => "Sant'Ambrogio",
            Holiday::ImmacolataConcezione => "Immacolata Concezione",
            Holiday::Natale => "Natale",
            Holiday::SantoStefano => "Santo Stefano",
        }
    }

    /// Date the holiday falls on in `year`
    pub fn date(&self, year: i32) -> Option<NaiveDate> {
        let fixed = |month, day| NaiveDate::from_ymd_opt(year, month, day);
        match self {
            Holiday::Capodanno => fixed(1, 1),
            Holiday::Epifania => fixed(1, 6),
            Holiday::Pasqua => easter_sunday(year),
            Holiday::LunediDellAngelo => {
                easter_sunday(year).and_then(|d| d.checked_add_days(Days::new(1)))
            }
            Holiday::FestaDellaLiberazione => fixed(4, 25),
            Holiday::FestaDeiLavoratori => fixed(5, 1),
            Holiday::FestaDellaRepubblica => fixed(6, 2),
            Holiday::AssunzioneDellaVergine => fixed(8, 15),
            Holiday::TuttiISanti => fixed(11, 1),
            Holiday::SantAmbrogio => fixed(12, 7),
            Holiday::ImmacolataConcezione => fixed(12, 8),
            Holiday::Natale => fixed(12, 25),
            Holiday::SantoStefano => fixed(12, 26),
        }
    }
}

/// Easter Sunday of a Gregorian year
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Holiday falling on `date`, if any
pub fn holiday_on(date: NaiveDate) -> Option<Holiday> {
    Holiday::ALL
        .into_iter()
        .find(|holiday| holiday.date(date.year()) == Some(date))
}

/// Italian holiday name for `date`
pub fn holiday_label(date: NaiveDate) -> Option<&'static str> {
    holiday_on(date).map(|holiday| holiday.label())
}

/// All holidays of `year`, in calendar order
pub fn holidays_in(year: i32) -> Vec<(NaiveDate, Holiday)> {
    let mut days: Vec<_> = Holiday::ALL
        .into_iter()
        .filter_map(|holiday| holiday.date(year).map(|date| (date, holiday)))
        .collect();
    days.sort_by_key(|(date, _)| *date);
    days
}
