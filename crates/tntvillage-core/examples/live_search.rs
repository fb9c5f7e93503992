use tntvillage_core::{
    EpisodeIndex, ProviderConfig, SceneNameParser, SearchParams, ShowEntry, TntClient,
    TntVillageProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Gomorra S01".to_string());

    let provider = TntVillageProvider::new(
        TntClient::new()?,
        SceneNameParser::new(vec![ShowEntry::new(1, "Gomorra")]),
        EpisodeIndex::new().with_season(1, 1, 12),
        ProviderConfig::default(),
    );

    println!("Searching '{}'...\n", query);

    let results = provider.search(&SearchParams::season(query), 0, None).await;

    println!("Found {} releases:", results.len());
    for (i, release) in results.iter().enumerate() {
        println!(
            "  {}. {} [S:{} L:{}]\n     {}",
            i + 1,
            release.title,
            release.seeders,
            release.leechers,
            release.link
        );
    }

    Ok(())
}
