//! Ten hand-drawn digits, one per class, stored as glyph art.
//!
//! Each glyph decodes to an intensity that renders back to the same glyph:
//! `' '` 0, `.` 40, `:` 100, `*` 170, `#` 255.

use super::{Image, IMAGE_LEN, IMAGE_SIDE};

const fn glyph_intensity(glyph: u8) -> u8 {
    match glyph {
        b'#' => 255,
        b'*' => 170,
        b':' => 100,
        b'.' => 40,
        _ => 0,
    }
}

const fn decode(rows: [&str; IMAGE_SIDE]) -> Image {
    let mut img = [0u8; IMAGE_LEN];
    let mut y = 0;
    while y < IMAGE_SIDE {
        let row = rows[y].as_bytes();
        let mut x = 0;
        while x < IMAGE_SIDE && x < row.len() {
            img[y * IMAGE_SIDE + x] = glyph_intensity(row[x]);
            x += 1;
        }
        y += 1;
    }
    img
}

/// Built-in images; entry `i` is a drawing of digit `i`.
pub static DIGITS: [Image; 10] = [
    ZERO, ONE, TWO, THREE, FOUR, FIVE, SIX, SEVEN, EIGHT, NINE,
];

const ZERO: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "           .****.           ",
    "          :######:          ",
    "         :########:         ",
    "        :####**####:        ",
    "        *###:  :###*        ",
    "       :###*    *###:       ",
    "       *###.    .###*       ",
    "       *##*      *##*       ",
    "      .###:      :###.      ",
    "      :###:      :###:      ",
    "      :###:      :###:      ",
    "      :###:      :###:      ",
    "      :###:      :###:      ",
    "      .###:      :###.      ",
    "       *##*      *##*       ",
    "       *###.    .###*       ",
    "       :###*    *###:       ",
    "        *###:  :###*        ",
    "        :####**####:        ",
    "         :########:         ",
    "          :######:          ",
    "           .****.           ",
    "                            ",
    "                            ",
    "                            ",
]);

const ONE: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "             .**.           ",
    "            :###*           ",
    "           *####*           ",
    "         .*#####*           ",
    "         *######*           ",
    "         *###*##*           ",
    "         .**.*##*           ",
    "             *##*           ",
    "             *##*           ",
    "             *##*           ",
    "             *##*           ",
    "             *##*           ",
    "             *##*           ",
    "             *##*           ",
    "             *##*           ",
    "             *##*           ",
    "             *##*           ",
    "             *##*           ",
    "         .****##****.       ",
    "         *##########*       ",
    "         *##########*       ",
    "         .**********.       ",
    "                            ",
    "                            ",
    "                            ",
]);

const TWO: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "           :****:           ",
    "         .*######*.         ",
    "        .*########*.        ",
    "        *####**####*        ",
    "       :###*.  .*###:       ",
    "       :###.    .###*       ",
    "       .*#*      *##*       ",
    "         .      :###*       ",
    "               .*###:       ",
    "              .*###*        ",
    "              *###*.        ",
    "             :###*.         ",
    "            :####:          ",
    "           .*###:           ",
    "          .*###*            ",
    "          *###*.            ",
    "         :###*.             ",
    "        :####:              ",
    "       .*###*********.      ",
    "       *#############*      ",
    "       *#############*      ",
    "       .*************.      ",
    "                            ",
    "                            ",
    "                            ",
]);

const THREE: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "          .:***:.           ",
    "         *#######*          ",
    "        *#########*         ",
    "       :####***####:        ",
    "       *###:   :###*        ",
    "       *##:     :###.       ",
    "       :**      :###:       ",
    "                :###.       ",
    "            .:::###*        ",
    "           .*######:        ",
    "           :######*         ",
    "           :#######:        ",
    "            :***###*.       ",
    "                *###:       ",
    "                .*##*       ",
    "                 *##*       ",
    "       :**      .*##*       ",
    "       *##*     *###:       ",
    "       *###*:::*###*.       ",
    "       :###########:        ",
    "        :#########:         ",
    "         .*#####*.          ",
    "           .:::.            ",
    "                            ",
    "                            ",
]);

const FOUR: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "               .**.         ",
    "               *##*         ",
    "              *###*         ",
    "             :####*         ",
    "            .#####*         ",
    "            *#####*         ",
    "           *###*##*         ",
    "          :####*##*         ",
    "         .####:*##*         ",
    "         *###* *##*         ",
    "        *###*  *##*         ",
    "       :####.  *##*         ",
    "      .####*****##****.     ",
    "      *###############*     ",
    "      *###############*     ",
    "      .*********##****.     ",
    "               *##*         ",
    "               *##*         ",
    "               *##*         ",
    "               *##*         ",
    "               *##*         ",
    "               .**.         ",
    "                            ",
    "                            ",
    "                            ",
]);

const FIVE: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "        .***********.       ",
    "        *###########*       ",
    "        *###########*       ",
    "        *##*********.       ",
    "       .###:                ",
    "       :###:                ",
    "       :###:****:           ",
    "       :#########*.         ",
    "       *##########*:        ",
    "       *#####**####*.       ",
    "       *###*.  .*###:       ",
    "       .***.    .*##*       ",
    "                 :###.      ",
    "                 :###:      ",
    "                 :###:      ",
    "                 :###.      ",
    "        :**.    .*##*       ",
    "        *##*.  .*###:       ",
    "        *####**####*.       ",
    "        :*########*:        ",
    "         .*######*.         ",
    "           :****:           ",
    "                            ",
    "                            ",
    "                            ",
]);

const SIX: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "                .**.        ",
    "               :*##*        ",
    "              :####*        ",
    "             *####*.        ",
    "           .*####*.         ",
    "          .*####*           ",
    "          *####:            ",
    "         .###*:             ",
    "         *###***:           ",
    "        .*#######*.         ",
    "        :#########*.        ",
    "        *####**####*        ",
    "       :###*:  :*###:       ",
    "       *###:    :###*       ",
    "       *##*      *##*       ",
    "       *##*      *##*       ",
    "       *###:    :###*       ",
    "       :###*:  :*###:       ",
    "        *####**####*        ",
    "        .*########*.        ",
    "         .*######*.         ",
    "           :****:           ",
    "                            ",
    "                            ",
    "                            ",
]);

const SEVEN: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "      .**************.      ",
    "      *##############*      ",
    "      *##############*      ",
    "      .***********###:      ",
    "                .###*       ",
    "                :###:       ",
    "               .*##*.       ",
    "               :###:        ",
    "               *###.        ",
    "          .****###*.        ",
    "          *########*        ",
    "          *########*        ",
    "          .***###**.        ",
    "            .###*           ",
    "            :###:           ",
    "           .*##*.           ",
    "           :###:            ",
    "           *###.            ",
    "          :###*             ",
    "          *###.             ",
    "          *##*              ",
    "          .**.              ",
    "                            ",
    "                            ",
    "                            ",
]);

const EIGHT: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "           :****:           ",
    "         .*######*.         ",
    "         *########*         ",
    "        :####**####:        ",
    "        *###:  :###*        ",
    "       .###:    :###.       ",
    "       :###:    :###:       ",
    "       .###:    :###.       ",
    "        *###::::###*        ",
    "        :##########:        ",
    "        .*########*.        ",
    "        *##########*        ",
    "       :####****####:       ",
    "       *##*:    :*##*       ",
    "      .###:      :###.      ",
    "      :###:      :###:      ",
    "      .###:      :###.      ",
    "       *##*:    :*##*       ",
    "       :####*::*####:       ",
    "        *##########*        ",
    "        .*########*.        ",
    "          :*####*:          ",
    "            .::.            ",
    "                            ",
    "                            ",
]);

const NINE: Image = decode([
    "                            ",
    "                            ",
    "                            ",
    "           :****:           ",
    "         .*######*.         ",
    "        .*########*.        ",
    "        *####**####*        ",
    "       :###*:  :*###:       ",
    "       *###:    :###*       ",
    "       *##*      *##*       ",
    "       *##*     .*##*       ",
    "       *###:    :###*       ",
    "       :###*:  :*###:       ",
    "        *####**####*        ",
    "        .*#########*        ",
    "         .*########:        ",
    "           :****##*.        ",
    "              *###*         ",
    "             *###*.         ",
    "            :####:          ",
    "           :####:           ",
    "          .*###*            ",
    "          *###*             ",
    "          *##*.             ",
    "          .**.              ",
    "                            ",
    "                            ",
    "                            ",
]);
