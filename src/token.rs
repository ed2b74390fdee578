//! Token registry: per-token properties and the ETH/WETH relationship.

use rustc_hash::FxHashMap;
use swapmaker_venue::Address;

/// Properties of a tradable token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenProps {
    pub symbol: String,
    pub decimals: u8,
}

impl TokenProps {
    pub fn new(symbol: &str, decimals: u8) -> Self {
        TokenProps {
            symbol: symbol.to_string(),
            decimals,
        }
    }

    /// Scaling factor between raw integer units and human units.
    pub fn scale(&self) -> f64 {
        10f64.powi(self.decimals as i32)
    }
}

/// A (maker, taker) trading pair key.
///
/// Used for all per-pair maps; an absent entry always means "unset", which
/// is distinct from an entry that is present with value zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    pub maker: Address,
    pub taker: Address,
}

impl Pair {
    pub fn new(maker: Address, taker: Address) -> Self {
        Pair { maker, taker }
    }
}

/// Registry of every token the engine knows, plus which address is wrapped
/// ETH. Native ETH (the zero address) is always registered.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    props: FxHashMap<Address, TokenProps>,
    weth: Address,
}

impl TokenRegistry {
    pub fn new(weth: Address) -> Self {
        let mut props = FxHashMap::default();
        props.insert(Address::ETH, TokenProps::new("ETH", 18));
        TokenRegistry { props, weth }
    }

    pub fn insert(&mut self, address: Address, props: TokenProps) {
        self.props.insert(address, props);
    }

    pub fn props(&self, address: Address) -> Option<&TokenProps> {
        self.props.get(&address)
    }

    pub fn eth(&self) -> Address {
        Address::ETH
    }

    pub fn weth(&self) -> Address {
        self.weth
    }

    /// True for native ETH and its wrapped form — one allocation bucket.
    pub fn is_eth_family(&self, address: Address) -> bool {
        address.is_eth() || address == self.weth
    }

    /// All registered token addresses.
    pub fn tokens(&self) -> impl Iterator<Item = Address> + '_ {
        self.props.keys().copied()
    }

    /// Symbol for display; falls back to the address when unknown.
    pub fn symbol(&self, address: Address) -> String {
        self.props
            .get(&address)
            .map(|p| p.symbol.clone())
            .unwrap_or_else(|| address.to_string())
    }

    /// "MAKER/TAKER" label for a pair, for logs and notifications.
    pub fn pair_label(&self, pair: Pair) -> String {
        format!("{}/{}", self.symbol(pair.maker), self.symbol(pair.taker))
    }
}
