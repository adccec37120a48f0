//! Built-in rule sets for the movie sentiment analysis script.
//!
//! Both sets target `src/scripts/analyzeMovieSentiments.ts` and are
//! independent of each other: `official-matches` moves the script to the typed
//! `matches` response, `direct-id-validation` makes the validation loop trust
//! an id returned by the model before falling back to semantic matching. The
//! payloads are opaque TypeScript; `\n` inside them is the TypeScript escape,
//! not a line break.

use crate::ruleset::RuleSet;

/// File both built-in sets are written against.
pub const SENTIMENT_SCRIPT: &str = "src/scripts/analyzeMovieSentiments.ts";

const VALIDATION_PREAMBLE: &str = r##"    console.log('\n🔍 Validando sugestões da IA com o sentimento de destino (Lógica Inteligente)...');
    const validatedSubSentiments: { suggestion: any; dbMatch: SubSentiment | null }[] = [];

    const allSubSentiments = await prisma.subSentiment.findMany({ where: { mainSentimentId: mainSentimentId } }); // Needed for matching

    for (const suggestion of analysis.matches) {"##;

const SPLIT_PREAMBLE: &str = r##"    // Separar OFFICIAL de SUGGESTION
    const officialMatches = analysis.matches.filter(m => m.type === 'OFFICIAL');
    const suggestions = analysis.matches.filter(m => m.type === 'SUGGESTION');

    console.log(`\n✅ Matches OFICIAIS encontrados: ${officialMatches.length}`);
    officialMatches.forEach(m => {
      console.log(`   - ${m.name} (Relevância: ${m.relevance.toFixed(2)})`);
    });

    if (suggestions.length > 0) {
      console.log(`\n💡 SUGESTÕES para curador (não serão gravadas automaticamente):`);
      suggestions.forEach(s => {
        console.log(`   - ${s.name} (Relevância: ${s.relevance.toFixed(2)}): ${s.explanation}`);
      });
    }

    console.log('\n🔍 Validando matches OFICIAIS com o banco de dados...');
    const validatedSubSentiments: { suggestion: any; dbMatch: SubSentiment | null }[] = [];

    const allSubSentiments = await prisma.subSentiment.findMany({ where: { mainSentimentId: mainSentimentId } });

    // Processar apenas OFFICIAL para gravação
    for (const match of officialMatches) {"##;

const SCOPED_MATCH_LOOP: &str = r##"    for (const suggestion of (analysis.suggestedSubSentiments || [])) {
      // MELHORIA: SEMPRE tentar matching primeiro, mesmo quando isNew=true
      // A IA pode marcar como novo incorretamente, então validamos sempre
      console.log(`\n🔍 Validando sugestão: "${suggestion.name}" (IA marcou como ${suggestion.isNew ? 'NOVO' : 'EXISTENTE'})`);

      const bestMatch = findBestMatch(suggestion, allSubSentiments);

      if (bestMatch) {
        if (bestMatch.mainSentimentId === mainSentimentId) {
          console.log(`✅ Match encontrado: IA "${suggestion.name}" -> BD "${bestMatch.name}" (ID: ${bestMatch.id})`);
          // SEMPRE usar o match encontrado, ignorando a flag isNew da IA
          validatedSubSentiments.push({ suggestion, dbMatch: bestMatch });
        } else {
          console.log(`❌ Descartado: Match "${bestMatch.name}" pertence a outro sentimento (ID: ${bestMatch.mainSentimentId})`);
          // Se não encontrou match no sentimento correto, tratar como novo apenas se realmente necessário
          validatedSubSentiments.push({ suggestion, dbMatch: null });
        }
      } else {"##;

const DIRECT_ID_MATCH_LOOP: &str = r##"    for (const suggestion of (analysis.suggestedSubSentiments || [])) {
      console.log(`\n🔍 Validando sugestão: "${suggestion.name}" (IA marcou como ${suggestion.isNew ? 'NOVO' : 'EXISTENTE'})${suggestion.id ? ` com ID ${suggestion.id}` : ''}`);

      let bestMatch: SubSentiment | null = null;

      // Se a IA retornou um ID (match OFFICIAL), confiar nele
      if (suggestion.id) {
        bestMatch = allSubSentiments.find(ss => ss.id === suggestion.id) || null;

        if (bestMatch) {
          console.log(`✅ Match direto por ID: "${suggestion.name}" -> "${bestMatch.name}" (ID: ${bestMatch.id})`);
          validatedSubSentiments.push({ suggestion, dbMatch: bestMatch });
          continue;
        } else {
          console.log(`⚠️ ID ${suggestion.id} não encontrado. Tentando matching semântico...`);
        }
      }

      // Se não tem ID ou ID não encontrado, fazer matching semântico
      bestMatch = findBestMatch(suggestion, allSubSentiments);

      if (bestMatch) {
        console.log(`✅ Match semântico: IA "${suggestion.name}" -> BD "${bestMatch.name}" (ID: ${bestMatch.id})`);
        validatedSubSentiments.push({ suggestion, dbMatch: bestMatch });
      } else {"##;

/// Switch from `suggestedSubSentiments` to typed `matches`, recording only
/// OFFICIAL matches and listing SUGGESTION entries for the curator.
pub fn official_matches() -> RuleSet {
    RuleSet::new("official-matches")
        .with_description("Record OFFICIAL matches only; list SUGGESTION entries for curation")
        .with_target(SENTIMENT_SCRIPT)
        .literal(
            "rename-suggested-field",
            "analysis.suggestedSubSentiments",
            "analysis.matches",
        )
        .block("split-official-matches", VALIDATION_PREAMBLE, SPLIT_PREAMBLE)
        .regex(
            "loop-over-official-matches",
            r"for \(const suggestion of analysis\.matches\)",
            "for (const match of officialMatches)",
        )
        .regex(
            "log-official-match",
            r#"console\.log\(`\\n🔍 Validando sugestão: "\$\{suggestion\.name\}""#,
            r#"console.log(`\n🔍 Validando match oficial: "$${match.name}" (ID: $${match.id})"#,
        )
}

/// Trust an id returned by the model before semantic matching, and stop
/// scoping aggressive word matching to the current main sentiment.
pub fn direct_id_validation() -> RuleSet {
    RuleSet::new("direct-id-validation")
        .with_description("Match suggestions by returned id first, then semantically")
        .with_target(SENTIMENT_SCRIPT)
        .block("match-by-id-first", SCOPED_MATCH_LOOP, DIRECT_ID_MATCH_LOOP)
        .regex(
            "unscope-word-matching",
            r"if \(matchingWords\.length > 0 && dbSub\.mainSentimentId === mainSentimentId\)",
            "if (matchingWords.length > 0)",
        )
}

/// Every built-in rule set, in listing order.
pub fn all() -> Vec<RuleSet> {
    vec![official_matches(), direct_id_validation()]
}

/// Look up a built-in rule set by name.
pub fn lookup(name: &str) -> Option<RuleSet> {
    all().into_iter().find(|set| set.name() == name)
}
