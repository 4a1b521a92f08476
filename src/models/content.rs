// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static page content: essential duas, recommended deeds, meal ideas.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EssentialDua {
    pub title: &'static str,
    pub arabic: &'static str,
    pub translation: &'static str,
    pub source: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Amol {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct QuickLink {
    pub title: &'static str,
    pub description: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Hadith {
    pub text: &'static str,
    pub source: &'static str,
}

pub const ESSENTIAL_DUAS: &[EssentialDua] = &[
    EssentialDua {
        title: "Dua for Breaking Fast",
        arabic: "اللَّهُمَّ لَكَ صُمْتُ وَعَلَى رِزْقِكَ أَفْطَرْتُ",
        translation: "O Allah, I fasted for You and I break my fast with Your provision.",
        source: "Abu Dawud",
    },
    EssentialDua {
        title: "Dua for Laylatul Qadr",
        arabic: "اللَّهُمَّ إِنَّكَ عَفُوٌّ تُحِبُّ الْعَفْوَ فَاعْفُ عَنِّي",
        translation: "O Allah, You are the Most Forgiving, and You love forgiveness, so forgive me.",
        source: "Tirmidhi",
    },
    EssentialDua {
        title: "Dua Before Eating",
        arabic: "بِسْمِ اللَّهِ وَعَلَى بَرَكَةِ اللَّهِ",
        translation: "In the name of Allah and with the blessings of Allah.",
        source: "Abu Dawud",
    },
];

pub const RECOMMENDED_AMOL: &[Amol] = &[
    Amol {
        title: "Recite Quran",
        description: "Read at least 1 Juz daily to complete in Ramadan",
    },
    Amol {
        title: "Give Sadaqah",
        description: "Give charity every day, even a small amount",
    },
    Amol {
        title: "Pray Taraweeh",
        description: "Attend Taraweeh prayers at the mosque",
    },
    Amol {
        title: "Dhikr & Istighfar",
        description: "Remember Allah and seek forgiveness frequently",
    },
];

pub const SUHOOR_SUGGESTIONS: &[&str] = &[
    "Oatmeal with dates and honey",
    "Whole grain bread with eggs",
    "Yogurt with fruits and nuts",
    "Banana smoothie with milk",
];

pub const IFTAR_SUGGESTIONS: &[&str] = &[
    "Dates and water (Sunnah)",
    "Lentil soup",
    "Fresh fruit salad",
    "Grilled chicken with rice",
];

pub const SUHOOR_HADITH: Hadith = Hadith {
    text: "The Prophet ﷺ said: Take Suhoor, for in Suhoor there is blessing.",
    source: "Sahih Bukhari & Muslim",
};

const PUBLIC_LINKS: &[QuickLink] = &[
    QuickLink {
        title: "Salat Tracker",
        description: "Track your 5 daily prayers and never miss a Salat",
        path: "/salat",
    },
    QuickLink {
        title: "Suhoor & Iftar",
        description: "Get Suhoor & Iftar timings with meal suggestions",
        path: "/suhoor-iftar",
    },
    QuickLink {
        title: "Dua & Amol",
        description: "Daily duas, azkar, and good deeds to perform",
        path: "/dua-amol",
    },
];

const TRACKER_LINK: QuickLink = QuickLink {
    title: "Daily Tracker",
    description: "Track your daily Ramadan ibadah progress",
    path: "/daily-tracker",
};

/// Dashboard quick links; the tracker link is only offered when signed in.
pub fn quick_links(signed_in: bool) -> Vec<QuickLink> {
    let mut links = PUBLIC_LINKS.to_vec();
    if signed_in {
        links.push(TRACKER_LINK);
    }
    links
}
