use chrono::{Duration, TimeZone, Utc};
use reqwest::Url;

use super::*;
use crate::normalize::PLACEHOLDER_THUMBNAIL;
use crate::types::Platform;

fn ctx(page: &str) -> ParseContext {
    ParseContext {
        now: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        base: Url::parse(page).ok(),
        estimated_promo_days: 7,
        include_upcoming: true,
    }
}

fn titles(listings: &[GameListing]) -> Vec<&str> {
    listings.iter().map(|l| l.title.as_str()).collect()
}

#[test]
fn source_names_round_trip() {
    for source in Source::ALL {
        assert_eq!(Source::from_name(source.name()), Some(source));
    }
    assert_eq!(Source::from_name("origin"), None);
}

#[test]
fn epic_extractors_share_one_upstream_request() {
    let permanent = Source::EpicPermanent.request(Source::EpicPermanent.default_url());
    let temporary = Source::EpicTemporary.request(Source::EpicTemporary.default_url());
    assert_eq!(permanent.cache_key(), temporary.cache_key());

    let steam_free = Source::SteamFree.request(Source::SteamFree.default_url());
    let steam_sale = Source::SteamDiscounted.request(Source::SteamDiscounted.default_url());
    assert_ne!(steam_free.cache_key(), steam_sale.cache_key());
}

#[test]
fn every_source_survives_garbage() {
    let bodies = ["", "   ", "{not json", "<html><body><p>Service Unavailable</p></body></html>", "[]", "{}"];

    for source in Source::ALL {
        for body in bodies {
            match source.parse(body, &ctx(source.default_url())) {
                Ok(listings) => assert!(listings.is_empty(), "{source} produced listings from {body:?}"),
                Err(_) => {}
            }
        }
    }
}

const FREETOGAME: &str = r#"[
    {
        "id": 1,
        "title": "Warframe",
        "thumbnail": "https://www.freetogame.com/g/1/thumbnail.jpg",
        "short_description": "A cooperative free-to-play third person online action shooter.",
        "game_url": "https://www.freetogame.com/open/warframe",
        "genre": "Action",
        "platform": "PC (Windows)",
        "publisher": "Digital Extremes",
        "freetogame_profile_url": "https://www.freetogame.com/warframe"
    },
    { "id": 2, "title": "   ", "game_url": "https://www.freetogame.com/open/blank" },
    { "id": 3, "title": "No Link", "game_url": null },
    { "id": 4, "title": 42 },
    {
        "id": 5,
        "title": "Browser Thing",
        "freetogame_profile_url": "https://www.freetogame.com/browser-thing",
        "genre": null,
        "platform": "Web Browser"
    }
]"#;

#[test]
fn freetogame_maps_catalogue_entries() {
    let listings = freetogame::parse_json(FREETOGAME, &ctx(freetogame::URL)).unwrap();
    assert_eq!(titles(&listings), ["Warframe", "Browser Thing"]);

    let warframe = &listings[0];
    assert_eq!(warframe.link, "https://www.freetogame.com/open/warframe");
    assert_eq!(warframe.thumbnail, "https://www.freetogame.com/g/1/thumbnail.jpg");
    assert_eq!(warframe.genre, "action");
    assert_eq!(warframe.store, Store::Unknown);
    assert!(warframe.platforms.contains(&Platform::Windows));
    assert!(warframe.discount.is_none());

    let browser = &listings[1];
    assert_eq!(browser.link, "https://www.freetogame.com/browser-thing");
    assert_eq!(browser.genre, "other");
    assert_eq!(browser.thumbnail, PLACEHOLDER_THUMBNAIL);
    assert_eq!(browser.platforms.len(), 3);
}

#[test]
fn freetogame_rejects_non_array() {
    let err = freetogame::parse_json(r#"{"status": 0, "status_message": "No results found"}"#, &ctx(freetogame::URL));
    assert!(matches!(err, Err(ExtractError::Shape(_))));
}

fn epic_feed(elements: &str) -> String {
    format!(r#"{{"data": {{"Catalog": {{"searchStore": {{"elements": [{elements}], "paging": {{"count": 1000, "total": 5}}}}}}}}}}"#)
}

const EPIC_GIVEAWAY: &str = r#"{
    "title": "Free Now Game",
    "productSlug": "free-now-game",
    "offerType": "BASE_GAME",
    "keyImages": [
        { "type": "Thumbnail", "url": "https://cdn1.epicgames.com/thumb.jpg" },
        { "type": "OfferImageWide", "url": "https://cdn1.epicgames.com/wide.jpg" }
    ],
    "price": { "totalPrice": { "originalPrice": 1999, "discountPrice": 0, "currencyCode": "USD" } },
    "promotions": {
        "promotionalOffers": [{
            "promotionalOffers": [{
                "startDate": "2024-05-02T15:00:00.000Z",
                "endDate": "2024-05-09T15:00:00.000Z",
                "discountSetting": { "discountType": "PERCENTAGE", "discountPercentage": 0 }
            }]
        }],
        "upcomingPromotionalOffers": []
    }
}"#;

const EPIC_MAPPED: &str = r#"{
    "title": "Mapped Game",
    "productSlug": null,
    "catalogNs": { "mappings": [{ "pageSlug": "mapped-game", "pageType": "productHome" }] },
    "price": { "totalPrice": { "originalPrice": 999, "discountPrice": 0 } },
    "promotions": {
        "promotionalOffers": [{
            "promotionalOffers": [{
                "endDate": "2024-05-09T15:00:00.000Z",
                "discountSetting": { "discountPercentage": 0 }
            }]
        }]
    }
}"#;

const EPIC_SALE: &str = r#"{
    "title": "Half Price Game",
    "productSlug": "half-price-game",
    "price": { "totalPrice": { "originalPrice": 2000, "discountPrice": 1000 } },
    "promotions": {
        "promotionalOffers": [{
            "promotionalOffers": [{ "discountSetting": { "discountPercentage": 50 } }]
        }]
    }
}"#;

const EPIC_ALWAYS_FREE: &str = r#"{
    "title": "Always Free",
    "productSlug": "always-free/home",
    "keyImages": [{ "type": "DieselStoreFrontTall", "url": "https://cdn1.epicgames.com/tall.jpg" }],
    "price": { "totalPrice": { "originalPrice": 0, "discountPrice": 0 } },
    "promotions": null
}"#;

const EPIC_UPCOMING: &str = r#"{
    "title": "Next Week",
    "productSlug": null,
    "offerMappings": [{ "pageSlug": "next-week", "pageType": "offer" }],
    "price": { "totalPrice": { "originalPrice": 1499, "discountPrice": 1499 } },
    "promotions": {
        "promotionalOffers": [],
        "upcomingPromotionalOffers": [{
            "promotionalOffers": [{
                "startDate": "2024-05-09T15:00:00.000Z",
                "endDate": "2024-05-16T15:00:00.000Z",
                "discountSetting": { "discountPercentage": 0 }
            }]
        }]
    }
}"#;

const EPIC_MYSTERY: &str = r#"{
    "title": "Mystery Game",
    "productSlug": "[]",
    "price": { "totalPrice": { "originalPrice": 0, "discountPrice": 0 } },
    "promotions": {
        "promotionalOffers": [{
            "promotionalOffers": [{ "discountSetting": { "discountPercentage": 0 } }]
        }]
    }
}"#;

#[test]
fn epic_temporary_picks_current_giveaways() {
    let body = epic_feed(&[EPIC_GIVEAWAY, EPIC_MAPPED, EPIC_SALE, EPIC_ALWAYS_FREE, EPIC_UPCOMING, EPIC_MYSTERY].join(","));
    let listings = epic::parse_json(&body, &ctx(epic::URL), epic::Mode::Temporary).unwrap();

    assert_eq!(titles(&listings), ["Free Now Game", "Mapped Game"]);

    let giveaway = &listings[0];
    assert_eq!(giveaway.link, "https://store.epicgames.com/en-US/p/free-now-game");
    assert_eq!(giveaway.thumbnail, "https://cdn1.epicgames.com/wide.jpg");
    assert_eq!(giveaway.store, Store::Epic);
    assert_eq!(giveaway.end_date, Some(Utc.with_ymd_and_hms(2024, 5, 9, 15, 0, 0).unwrap()));
    assert!(!giveaway.end_date_estimated);

    let discount = giveaway.discount.unwrap();
    assert!(discount.is_free());
    assert_eq!(discount.original_price, 19.99);

    assert_eq!(listings[1].link, "https://store.epicgames.com/en-US/p/mapped-game");
}

#[test]
fn epic_temporary_falls_back_to_upcoming() {
    let body = epic_feed(&[EPIC_SALE, EPIC_UPCOMING].join(","));

    let listings = epic::parse_json(&body, &ctx(epic::URL), epic::Mode::Temporary).unwrap();
    assert_eq!(titles(&listings), ["Next Week (Upcoming)"]);
    assert_eq!(listings[0].link, "https://store.epicgames.com/en-US/p/next-week");
    assert_eq!(listings[0].end_date, Some(Utc.with_ymd_and_hms(2024, 5, 16, 15, 0, 0).unwrap()));

    let mut no_upcoming = ctx(epic::URL);
    no_upcoming.include_upcoming = false;
    let listings = epic::parse_json(&body, &no_upcoming, epic::Mode::Temporary).unwrap();
    assert!(listings.is_empty());
}

#[test]
fn epic_permanent_needs_zero_price_and_no_promotion() {
    let body = epic_feed(&[EPIC_GIVEAWAY, EPIC_ALWAYS_FREE, EPIC_MYSTERY, EPIC_UPCOMING].join(","));
    let listings = epic::parse_json(&body, &ctx(epic::URL), epic::Mode::Permanent).unwrap();

    assert_eq!(titles(&listings), ["Always Free"]);
    assert_eq!(listings[0].link, "https://store.epicgames.com/en-US/p/always-free");
    assert_eq!(listings[0].thumbnail, "https://cdn1.epicgames.com/tall.jpg");
    assert!(listings[0].discount.is_none());
}

#[test]
fn epic_without_elements_is_a_shape_error() {
    let err = epic::parse_json(r#"{"errors": [{"message": "boom"}]}"#, &ctx(epic::URL), epic::Mode::Temporary);
    assert!(matches!(err, Err(ExtractError::Shape(_))));

    let err = epic::parse_json("<html></html>", &ctx(epic::URL), epic::Mode::Temporary);
    assert!(matches!(err, Err(ExtractError::Json(_))));
}

const STEAM: &str = r#"
<html><body>
<div id="search_resultsRows">
    <a href="https://store.steampowered.com/app/100/Free_Game/?snr=1_7_7_2300_150_1" class="search_result_row ds_collapse_flag">
        <div class="col search_capsule">
            <img src="https://cdn.akamai.steamstatic.com/steam/apps/100/capsule_sm_120.jpg" srcset="https://cdn.akamai.steamstatic.com/steam/apps/100/capsule_sm_120.jpg 1x, https://cdn.akamai.steamstatic.com/steam/apps/100/capsule_231x87.jpg 2x">
        </div>
        <div class="responsive_search_name_combined">
            <div class="col search_name ellipsis">
                <span class="title">Free   Game</span>
                <div><span class="platform_img win"></span><span class="platform_img mac"></span></div>
            </div>
            <div class="col search_price_discount_combined" data-price-final="0">
                <div class="col search_discount_block" data-price-final="0" data-bundlediscount="0" data-discount="100">
                    <div class="discount_pct">-100%</div>
                    <div class="discount_prices">
                        <div class="discount_original_price">$19.99</div>
                        <div class="discount_final_price">Free</div>
                    </div>
                </div>
            </div>
        </div>
    </a>
    <a href="https://store.steampowered.com/app/200/Half_Game/?snr=1_7_7" class="search_result_row">
        <div class="col search_capsule"><img src="https://cdn.akamai.steamstatic.com/steam/apps/200/capsule_sm_120.jpg"></div>
        <span class="title">Half Game</span>
        <div class="search_discount_block" data-price-final="1199" data-discount="40">
            <div class="discount_pct">-40%</div>
            <div class="discount_original_price">$19.99</div>
            <div class="discount_final_price">$11.99</div>
        </div>
    </a>
    <a href="https://store.steampowered.com/app/300/Old_Layout/" class="search_result_row">
        <span class="title">Old Layout</span>
        <div class="search_discount"><span>-75%</span></div>
        <div class="search_price"><span><strike>$8.00</strike></span><br>$2.00</div>
    </a>
    <a href="https://store.steampowered.com/app/400/Full_Price/" class="search_result_row">
        <span class="title">Full Price</span>
        <div class="search_discount_block" data-price-final="999"></div>
    </a>
</div>
</body></html>
"#;

#[test]
fn steam_free_keeps_only_full_discounts() {
    let ctx = ctx(steam::URL);
    let listings = steam::parse_html(STEAM, &ctx, steam::Mode::Free).unwrap();
    assert_eq!(titles(&listings), ["Free Game"]);

    let game = &listings[0];
    assert_eq!(game.link, "https://store.steampowered.com/app/100/Free_Game/");
    assert_eq!(game.thumbnail, "https://cdn.akamai.steamstatic.com/steam/apps/100/capsule_sm_120.jpg");
    assert_eq!(game.platforms, [Platform::Windows, Platform::Mac].into_iter().collect());
    assert_eq!(game.end_date, Some(ctx.now + Duration::days(7)));
    assert!(game.end_date_estimated);

    let discount = game.discount.unwrap();
    assert_eq!(discount.discount_percentage, 100);
    assert_eq!(discount.original_price, 19.99);
    assert_eq!(discount.final_price, 0.0);
}

#[test]
fn steam_discounted_reads_both_layouts() {
    let listings = steam::parse_html(STEAM, &ctx(steam::URL), steam::Mode::Discounted).unwrap();
    assert_eq!(titles(&listings), ["Free Game", "Half Game", "Old Layout"]);

    let half = listings[1].discount.unwrap();
    assert_eq!(half.discount_percentage, 40);
    assert_eq!(half.final_price, 11.99);
    assert!(listings[1].end_date.is_none());

    let old = listings[2].discount.unwrap();
    assert_eq!(old.discount_percentage, 75);
    assert_eq!(old.original_price, 8.0);
}

#[test]
fn steam_without_results_container_is_a_shape_error() {
    let err = steam::parse_html("<html><body>Access denied</body></html>", &ctx(steam::URL), steam::Mode::Free);
    assert!(matches!(err, Err(ExtractError::Shape(_))));

    let empty = steam::parse_html(r#"<div id="search_resultsRows"></div>"#, &ctx(steam::URL), steam::Mode::Free).unwrap();
    assert!(empty.is_empty());
}

const GOG: &str = r#"{
    "pages": 1,
    "productCount": 4,
    "products": [
        {
            "id": "1",
            "slug": "free_forever",
            "title": "Free Forever",
            "storeLink": "https://www.gog.com/en/game/free_forever",
            "coverHorizontal": "https://images.gog-statics.com/free_forever.jpg",
            "genres": [{ "name": "Adventure", "slug": "adventure" }],
            "operatingSystems": ["windows", "osx"],
            "price": {
                "final": "$0.00",
                "base": "$0.00",
                "discount": null,
                "finalMoney": { "amount": "0.00", "currency": "USD", "discount": "0.00" },
                "baseMoney": { "amount": "0.00", "currency": "USD" }
            }
        },
        {
            "id": "2",
            "slug": "giveaway",
            "title": "Giveaway",
            "coverVertical": "https://images.gog-statics.com/giveaway.jpg",
            "price": {
                "discount": "-100%",
                "finalMoney": { "amount": "0.00" },
                "baseMoney": { "amount": "9.99" }
            }
        },
        {
            "id": "3",
            "slug": "half_off",
            "title": "Half Off",
            "operatingSystems": ["linux"],
            "price": { "discount": "-50%", "finalMoney": { "amount": "4.99" }, "baseMoney": { "amount": "9.99" } }
        },
        {
            "id": "4",
            "slug": "full_price",
            "title": "Full Price",
            "price": { "final": "$9.99", "base": "$9.99" }
        }
    ]
}"#;

#[test]
fn gog_free_includes_zero_priced_titles() {
    let ctx = ctx(gog::URL);
    let listings = gog::parse_json(GOG, &ctx, gog::Mode::Free).unwrap();
    assert_eq!(titles(&listings), ["Free Forever", "Giveaway"]);

    let forever = &listings[0];
    assert_eq!(forever.genre, "adventure");
    assert_eq!(forever.platforms, [Platform::Windows, Platform::Mac].into_iter().collect());
    assert!(forever.discount.is_none());
    assert!(forever.end_date.is_none());

    let giveaway = &listings[1];
    assert_eq!(giveaway.link, "https://www.gog.com/en/game/giveaway");
    assert_eq!(giveaway.thumbnail, "https://images.gog-statics.com/giveaway.jpg");
    assert!(giveaway.discount.unwrap().is_free());
    assert_eq!(giveaway.end_date, Some(ctx.now + Duration::days(7)));
}

#[test]
fn gog_discounted_skips_full_price() {
    let listings = gog::parse_json(GOG, &ctx(gog::URL), gog::Mode::Discounted).unwrap();
    assert_eq!(titles(&listings), ["Giveaway", "Half Off"]);
    assert_eq!(listings[1].discount.unwrap().discount_percentage, 50);
    assert_eq!(listings[1].platforms, [Platform::Linux].into_iter().collect());
}

const PLAYSTATION: &str = r#"
<html><body><ul class="psw-grid-list">
<li>
    <div class="psw-product-tile">
        <a class="psw-link psw-content-link" href="/en-us/concept/10001" data-telemetry-meta='{"id":"10001","index":0,"name":"Fortnite","price":"Free"}'>
            <img data-qa="search#productTile0#game-art#image#image" src="https://image.api.playstation.com/fortnite.png?w=230&amp;thumb=true" alt="Fortnite">
            <span data-qa="search#productTile0#product-name">Fortnite</span>
            <span data-qa="search#productTile0#price#display-price">Free</span>
        </a>
    </div>
</li>
<li>
    <a class="psw-link" href="/en-us/product/UP0001-PAID" data-telemetry-meta='{"name":"Paid Game","price":"$59.99"}'>
        <span data-qa="search#productTile1#product-name">Paid Game</span>
        <span data-qa="search#productTile1#price#display-price">$59.99</span>
    </a>
</li>
<li>
    <a class="psw-link" href="/en-us/concept/10003" data-telemetry-meta='{"name":"Apex Legends","price":"Free"}'>
        <img src="data:image/gif;base64,R0lGOD" alt="">
    </a>
</li>
</ul></body></html>
"#;

#[test]
fn playstation_keeps_free_tiles() {
    let listings = playstation::parse_html(PLAYSTATION, &ctx(playstation::URL)).unwrap();
    assert_eq!(titles(&listings), ["Fortnite", "Apex Legends"]);

    let fortnite = &listings[0];
    assert_eq!(fortnite.link, "https://store.playstation.com/en-us/concept/10001");
    assert_eq!(fortnite.thumbnail, "https://image.api.playstation.com/fortnite.png");
    assert_eq!(fortnite.store, Store::Playstation);
    assert_eq!(fortnite.platforms, [Platform::Playstation].into_iter().collect());

    assert_eq!(listings[1].thumbnail, PLACEHOLDER_THUMBNAIL);
}

const XBOX: &str = r#"
<html><body><section>
    <a href="https://www.xbox.com/en-US/games/store/halo-infinite/9PP5G1F0C2B6" aria-label="Halo Infinite, Free">
        <img src="https://store-images.s-microsoft.com/image/halo.jpg" alt="Halo Infinite box art">
        <span class="ProductCard-module__title___nHGIp">Halo Infinite</span>
        <span class="Price-module__boldText___1i2Li">Free+</span>
    </a>
    <a href="/en-US/games/store/paid/9ABC">
        <span class="ProductCard-module__title___nHGIp">Paid Game</span>
        <span class="Price-module__boldText___1i2Li">$19.99</span>
    </a>
    <a href="/en-US/games/store/fortnite/BT5P2X999VH2" aria-label="Fortnite">
        <img src="//store-images.s-microsoft.com/image/fortnite.jpg">
    </a>
</section></body></html>
"#;

#[test]
fn xbox_resolves_relative_cards() {
    let listings = xbox::parse_html(XBOX, &ctx(xbox::URL)).unwrap();
    assert_eq!(titles(&listings), ["Halo Infinite", "Fortnite"]);

    assert_eq!(listings[0].link, "https://www.xbox.com/en-US/games/store/halo-infinite/9PP5G1F0C2B6");
    assert_eq!(listings[1].link, "https://www.xbox.com/en-US/games/store/fortnite/BT5P2X999VH2");
    assert_eq!(listings[1].thumbnail, "https://store-images.s-microsoft.com/image/fortnite.jpg");
    assert!(listings.iter().all(|l| l.store == Store::Xbox && l.platforms.contains(&Platform::Xbox)));
}

const HUMBLE: &str = r#"{
    "num_pages": 1,
    "results": [
        {
            "human_name": "Free Humble",
            "human_url": "free-humble",
            "large_capsule": "https://hb.imgix.net/free-humble.jpg",
            "full_price": { "amount": 14.99, "currency": "USD" },
            "current_price": { "amount": 0.0, "currency": "USD" },
            "platforms": ["windows", "mac"],
            "genres": ["Puzzle"]
        },
        {
            "human_name": "Old Shape",
            "human_url": "old-shape",
            "featured_image_small": "https://hb.imgix.net/old-shape.jpg",
            "full_price": [20.0, "USD"],
            "current_price": [5.0, "USD"]
        },
        {
            "human_name": "No Discount",
            "human_url": "no-discount",
            "full_price": { "amount": 10.0 },
            "current_price": { "amount": 10.0 }
        },
        { "human_name": "Broken Price", "human_url": "broken", "full_price": "n/a" }
    ]
}"#;

#[test]
fn humble_reads_both_price_shapes() {
    let ctx = ctx(humble::URL);
    let listings = humble::parse_json(HUMBLE, &ctx).unwrap();
    assert_eq!(titles(&listings), ["Free Humble", "Old Shape"]);

    let free = &listings[0];
    assert_eq!(free.link, "https://www.humblebundle.com/store/free-humble");
    assert_eq!(free.thumbnail, "https://hb.imgix.net/free-humble.jpg");
    assert_eq!(free.genre, "puzzle");
    assert!(free.discount.unwrap().is_free());
    assert!(free.end_date_estimated);

    let old = listings[1].discount.unwrap();
    assert_eq!(old.discount_percentage, 75);
    assert_eq!(old.original_price, 20.0);
    assert_eq!(old.final_price, 5.0);
}

const ITCHIO: &str = r#"
<html><body><div class="browse_game_grid">
<div class="game_cell has_cover lazy_images" data-game_id="1">
    <a class="thumb_link game_link" href="https://dev.itch.io/free-thing">
        <div class="game_thumb" data-background_image="https://img.itch.zone/free-bg.png">
            <img data-lazy_src="https://img.itch.zone/free.png" class="lazy_loaded">
        </div>
    </a>
    <div class="game_cell_data">
        <div class="game_title">
            <a class="title game_link" href="https://dev.itch.io/free-thing">Free Thing</a>
            <div class="price_tag meta_tag sale"><div class="price_value">$0.00</div><div class="sale_tag">-100%</div></div>
        </div>
        <div class="game_genre">Platformer</div>
        <div class="game_platform">
            <span title="Download for Windows" class="icon icon-windows8"></span>
            <span title="Download for Linux" class="icon icon-tux"></span>
        </div>
    </div>
</div>
<div class="game_cell" data-game_id="2">
    <div class="game_cell_data">
        <div class="game_title">
            <a class="title game_link" href="https://dev.itch.io/half-thing">Half Thing</a>
            <div class="price_tag meta_tag sale"><div class="price_value">$5.00</div><div class="sale_tag">-50%</div></div>
        </div>
    </div>
</div>
<div class="game_cell" data-game_id="3">
    <div class="game_cell_data">
        <div class="game_title">
            <a class="title game_link" href="https://dev.itch.io/full-price">Full Price</a>
            <div class="price_tag meta_tag"><div class="price_value">$3.00</div></div>
        </div>
    </div>
</div>
</div></body></html>
"#;

#[test]
fn itchio_reads_sale_tags() {
    let listings = itchio::parse_html(ITCHIO, &ctx(itchio::URL)).unwrap();
    assert_eq!(titles(&listings), ["Free Thing", "Half Thing"]);

    let free = &listings[0];
    assert_eq!(free.link, "https://dev.itch.io/free-thing");
    assert_eq!(free.thumbnail, "https://img.itch.zone/free.png");
    assert_eq!(free.genre, "platformer");
    assert_eq!(free.platforms, [Platform::Windows, Platform::Linux].into_iter().collect());
    assert!(free.discount.unwrap().is_free());

    let half = listings[1].discount.unwrap();
    assert_eq!(half.discount_percentage, 50);
    assert_eq!(half.original_price, 10.0);
    assert_eq!(half.final_price, 5.0);
}

const CHEAPSHARK: &str = r#"[
    {
        "internalName": "STEAMFREEBIE",
        "title": "Steam Freebie",
        "dealID": "abc%3D",
        "storeID": "1",
        "gameID": "1",
        "salePrice": "0.00",
        "normalPrice": "9.99",
        "isOnSale": "1",
        "savings": "100.000000",
        "steamAppID": "12345",
        "thumb": "https://cdn.cloudflare.steamstatic.com/steam/apps/12345/capsule_sm_120.jpg"
    },
    {
        "title": "Gog Half",
        "dealID": "def",
        "storeID": "7",
        "steamAppID": null,
        "salePrice": "5.00",
        "normalPrice": "10.00",
        "savings": "50.000000",
        "thumb": "https://images.gog.com/half.jpg"
    },
    { "title": "Mystery Store", "dealID": "ghi", "storeID": "99", "salePrice": "1.00", "normalPrice": "4.00", "savings": "75" },
    { "title": "No Savings", "dealID": "jkl", "storeID": "1", "salePrice": "4.00", "normalPrice": "4.00", "savings": "0.000000" },
    { "title": "Almost Free", "dealID": "mno", "storeID": "11", "salePrice": "0.04", "normalPrice": "9.99", "savings": "99.599600" }
]"#;

#[test]
fn cheapshark_resolves_stores_and_links() {
    let listings = cheapshark::parse_json(CHEAPSHARK, &ctx(cheapshark::URL)).unwrap();
    assert_eq!(titles(&listings), ["Steam Freebie", "Gog Half", "Mystery Store", "Almost Free"]);

    let steam = &listings[0];
    assert_eq!(steam.store, Store::Steam);
    assert_eq!(steam.link, "https://store.steampowered.com/app/12345");
    assert_eq!(steam.thumbnail, "https://cdn.cloudflare.steamstatic.com/steam/apps/12345/header.jpg");
    assert!(steam.discount.unwrap().is_free());

    assert_eq!(listings[1].store, Store::Gog);
    assert_eq!(listings[1].link, "https://www.cheapshark.com/redirect?dealID=def");
    assert_eq!(listings[1].discount.unwrap().discount_percentage, 50);

    assert_eq!(listings[2].store, Store::Unknown);
    assert_eq!(listings[2].thumbnail, PLACEHOLDER_THUMBNAIL);

    let almost = listings[3].discount.unwrap();
    assert_eq!(almost.discount_percentage, 99);
    assert_eq!(almost.final_price, 0.04);
    assert!(!almost.is_free());
    assert!(listings[3].end_date.is_none());
}
